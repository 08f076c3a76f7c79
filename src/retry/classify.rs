//! Failure classification.
//!
//! A [`RetryOn`] filter decides, once per failed attempt, whether the failure
//! is eligible for another attempt. Failures that do not match propagate
//! straight away.

use std::fmt;
use std::io;
use std::sync::Arc;

/// A failure type that belongs to a taxonomy of kinds.
///
/// Implement this for an error type to filter retries by kind with
/// [`RetryOn::kind`] and [`RetryOn::kinds`].
///
/// `is_kind` defaults to equality on [`Classify::kind`]. Override it when kinds
/// form a hierarchy, so that a failure also matches every broader kind it
/// belongs to.
///
/// # Examples
///
/// ```rust
/// use repeater::Classify;
///
/// #[derive(Debug)]
/// enum FetchError {
///     Refused,
///     Reset,
///     BadPayload,
/// }
///
/// #[derive(Debug, Clone, PartialEq)]
/// enum FetchKind {
///     Refused,
///     Reset,
///     BadPayload,
///     /// Any connection-level failure.
///     Connection,
/// }
///
/// impl Classify for FetchError {
///     type Kind = FetchKind;
///
///     fn kind(&self) -> FetchKind {
///         match self {
///             FetchError::Refused => FetchKind::Refused,
///             FetchError::Reset => FetchKind::Reset,
///             FetchError::BadPayload => FetchKind::BadPayload,
///         }
///     }
///
///     fn is_kind(&self, kind: &FetchKind) -> bool {
///         match kind {
///             FetchKind::Connection => {
///                 matches!(self, FetchError::Refused | FetchError::Reset)
///             }
///             other => self.kind() == *other,
///         }
///     }
/// }
///
/// assert!(FetchError::Reset.is_kind(&FetchKind::Connection));
/// assert!(!FetchError::BadPayload.is_kind(&FetchKind::Connection));
/// ```
pub trait Classify {
    /// The kind taxonomy.
    type Kind: fmt::Debug + PartialEq + Send + Sync + 'static;

    /// The most specific kind of this failure.
    fn kind(&self) -> Self::Kind;

    /// Whether this failure is `kind` or a subkind of it.
    fn is_kind(&self, kind: &Self::Kind) -> bool {
        self.kind() == *kind
    }
}

impl Classify for io::Error {
    type Kind = io::ErrorKind;

    fn kind(&self) -> io::ErrorKind {
        io::Error::kind(self)
    }
}

/// Decides which failures are retryable.
///
/// The default, [`RetryOn::any`], retries every failure.
///
/// # Examples
///
/// ```rust
/// use repeater::RetryOn;
/// use std::io;
///
/// let filter = RetryOn::<io::Error>::kinds([
///     io::ErrorKind::ConnectionRefused,
///     io::ErrorKind::TimedOut,
/// ]);
///
/// assert!(filter.matches(&io::Error::from(io::ErrorKind::TimedOut)));
/// assert!(!filter.matches(&io::Error::from(io::ErrorKind::NotFound)));
/// ```
pub struct RetryOn<E> {
    filter: Filter<E>,
}

enum Filter<E> {
    Any,
    Never,
    Predicate(Arc<dyn Fn(&E) -> bool + Send + Sync>),
}

impl<E> RetryOn<E> {
    /// Every failure is retryable.
    pub fn any() -> Self {
        Self { filter: Filter::Any }
    }

    /// No failure is retryable; the first failure always propagates.
    pub fn never() -> Self {
        Self {
            filter: Filter::Never,
        }
    }

    /// Failures for which `predicate` returns `true` are retryable.
    ///
    /// ```rust
    /// use repeater::RetryOn;
    ///
    /// let filter = RetryOn::when(|err: &String| err.starts_with("transient"));
    /// assert!(filter.matches(&"transient: busy".to_string()));
    /// assert!(!filter.matches(&"fatal: corrupt".to_string()));
    /// ```
    pub fn when<P>(predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
        E: 'static,
    {
        Self {
            filter: Filter::Predicate(Arc::new(predicate)),
        }
    }

    /// Failures of the given kind (or a subkind of it) are retryable.
    pub fn kind(kind: E::Kind) -> Self
    where
        E: Classify + 'static,
    {
        Self::kinds([kind])
    }

    /// Failures matching any of the given kinds are retryable.
    pub fn kinds<I>(kinds: I) -> Self
    where
        E: Classify + 'static,
        I: IntoIterator<Item = E::Kind>,
    {
        let kinds: Vec<E::Kind> = kinds.into_iter().collect();
        Self::when(move |error: &E| kinds.iter().any(|kind| error.is_kind(kind)))
    }

    /// Union of two filters: retryable if either matches.
    pub fn or(self, other: Self) -> Self
    where
        E: 'static,
    {
        match (self.filter, other.filter) {
            (Filter::Any, _) | (_, Filter::Any) => Self::any(),
            (Filter::Never, filter) | (filter, Filter::Never) => Self { filter },
            (Filter::Predicate(first), Filter::Predicate(second)) => {
                Self::when(move |error: &E| first(error) || second(error))
            }
        }
    }

    /// Returns true if `error` is retryable under this filter.
    pub fn matches(&self, error: &E) -> bool {
        match &self.filter {
            Filter::Any => true,
            Filter::Never => false,
            Filter::Predicate(predicate) => predicate(error),
        }
    }

    /// Returns true if this filter retries every failure.
    pub fn is_any(&self) -> bool {
        matches!(self.filter, Filter::Any)
    }
}

impl<E> Default for RetryOn<E> {
    fn default() -> Self {
        Self::any()
    }
}

impl<E> Clone for RetryOn<E> {
    fn clone(&self) -> Self {
        let filter = match &self.filter {
            Filter::Any => Filter::Any,
            Filter::Never => Filter::Never,
            Filter::Predicate(predicate) => Filter::Predicate(Arc::clone(predicate)),
        };
        Self { filter }
    }
}

impl<E> fmt::Debug for RetryOn<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.filter {
            Filter::Any => "Any",
            Filter::Never => "Never",
            Filter::Predicate(_) => "Predicate",
        };
        f.debug_tuple("RetryOn").field(&format_args!("{}", name)).finish()
    }
}

#[cfg(test)]
mod classify_tests {
    use super::*;

    #[derive(Debug)]
    enum NetError {
        Refused,
        Reset,
        Timeout,
        Parse,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum NetKind {
        Refused,
        Reset,
        Timeout,
        Parse,
        Connection,
    }

    impl Classify for NetError {
        type Kind = NetKind;

        fn kind(&self) -> NetKind {
            match self {
                NetError::Refused => NetKind::Refused,
                NetError::Reset => NetKind::Reset,
                NetError::Timeout => NetKind::Timeout,
                NetError::Parse => NetKind::Parse,
            }
        }

        fn is_kind(&self, kind: &NetKind) -> bool {
            match kind {
                NetKind::Connection => matches!(self, NetError::Refused | NetError::Reset),
                other => self.kind() == *other,
            }
        }
    }

    #[test]
    fn test_any_matches_everything() {
        let filter = RetryOn::<NetError>::any();
        assert!(filter.matches(&NetError::Refused));
        assert!(filter.matches(&NetError::Parse));
        assert!(filter.is_any());
    }

    #[test]
    fn test_default_is_any() {
        assert!(RetryOn::<NetError>::default().is_any());
    }

    #[test]
    fn test_never_matches_nothing() {
        let filter = RetryOn::<NetError>::never();
        assert!(!filter.matches(&NetError::Refused));
        assert!(!filter.matches(&NetError::Timeout));
    }

    #[test]
    fn test_single_kind() {
        let filter = RetryOn::kind(NetKind::Timeout);
        assert!(filter.matches(&NetError::Timeout));
        assert!(!filter.matches(&NetError::Refused));
    }

    #[test]
    fn test_kind_set() {
        let filter = RetryOn::kinds([NetKind::Timeout, NetKind::Reset]);
        assert!(filter.matches(&NetError::Timeout));
        assert!(filter.matches(&NetError::Reset));
        assert!(!filter.matches(&NetError::Refused));
        assert!(!filter.matches(&NetError::Parse));
    }

    #[test]
    fn test_supertype_kind_matches_subkinds() {
        let filter = RetryOn::kind(NetKind::Connection);
        assert!(filter.matches(&NetError::Refused));
        assert!(filter.matches(&NetError::Reset));
        assert!(!filter.matches(&NetError::Timeout));
        assert!(!filter.matches(&NetError::Parse));
    }

    #[test]
    fn test_empty_kind_set_matches_nothing() {
        let filter = RetryOn::<NetError>::kinds(Vec::new());
        assert!(!filter.matches(&NetError::Refused));
    }

    #[test]
    fn test_io_error_kinds() {
        let filter = RetryOn::<io::Error>::kind(io::ErrorKind::ConnectionRefused);
        assert!(filter.matches(&io::Error::new(io::ErrorKind::ConnectionRefused, "refused")));
        assert!(!filter.matches(&io::Error::new(io::ErrorKind::InvalidData, "garbage")));
    }

    #[test]
    fn test_or_combines_predicates() {
        let filter = RetryOn::kind(NetKind::Timeout).or(RetryOn::kind(NetKind::Parse));
        assert!(filter.matches(&NetError::Timeout));
        assert!(filter.matches(&NetError::Parse));
        assert!(!filter.matches(&NetError::Reset));
    }

    #[test]
    fn test_or_with_any_and_never() {
        assert!(RetryOn::<NetError>::never().or(RetryOn::any()).is_any());

        let filter = RetryOn::<NetError>::never().or(RetryOn::kind(NetKind::Reset));
        assert!(filter.matches(&NetError::Reset));
        assert!(!filter.matches(&NetError::Timeout));
    }

    #[test]
    fn test_clone_shares_predicate() {
        let filter = RetryOn::kind(NetKind::Reset);
        let cloned = filter.clone();
        assert!(cloned.matches(&NetError::Reset));
        assert!(!cloned.matches(&NetError::Refused));
    }

    #[test]
    fn test_debug_names_variant() {
        assert_eq!(format!("{:?}", RetryOn::<NetError>::any()), "RetryOn(Any)");
        assert_eq!(
            format!("{:?}", RetryOn::<NetError>::kind(NetKind::Reset)),
            "RetryOn(Predicate)"
        );
    }
}
