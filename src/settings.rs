use std::{fmt, sync::Arc};

use crate::{NormalizedResponse, Result, RetrierError};

/// Decides whether another attempt should follow the given record.
pub type RetryOn = Arc<dyn Fn(&NormalizedResponse) -> bool + Send + Sync>;

/// Observability callback invoked once per attempt.
pub type Logger = Arc<dyn Fn(&AttemptLog<'_>) + Send + Sync>;

/// Context handed to the [`Logger`] after each attempt.
#[derive(Clone, Copy, Debug)]
pub struct AttemptLog<'a> {
    pub title: &'a str,
    pub attempt: u32,
    pub response: &'a NormalizedResponse,
}

/// Effective retry configuration.
///
/// One instance backs a [`crate::Retrier`]; per-call overrides are merged
/// into a fresh copy with [`Settings::resolve`].
#[derive(Clone)]
pub struct Settings {
    /// Label used in log output only.
    pub title: String,
    /// Attempt ceiling, always at least 1.
    pub max_attempts: u32,
    /// Base delay unit in milliseconds.
    pub delay_ms: f64,
    /// Selects exponential over fixed backoff.
    pub exponential: bool,
    /// Box non-JSON bodies into an object.
    pub return_json: bool,
    pub retry_on: RetryOn,
    pub log: Logger,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            title: "Fetch Retrier".to_owned(),
            max_attempts: 1,
            delay_ms: 100.0,
            exponential: true,
            return_json: true,
            retry_on: Arc::new(retry_on_server_error),
            log: Arc::new(discard_log),
        }
    }
}

fn retry_on_server_error(response: &NormalizedResponse) -> bool {
    response.status >= 500
}

fn discard_log(_: &AttemptLog<'_>) {}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("title", &self.title)
            .field("max_attempts", &self.max_attempts)
            .field("delay_ms", &self.delay_ms)
            .field("exponential", &self.exponential)
            .field("return_json", &self.return_json)
            .field("retry_on", &"<fn>")
            .field("log", &"<fn>")
            .finish()
    }
}

impl Settings {
    /// Builds settings from the defaults with `options` applied.
    pub fn new(options: &RetrierOptions) -> Result<Self> {
        Self::default().resolve(options)
    }

    /// Validates `overrides` and returns `self` with every provided field
    /// replaced. `self` is never modified.
    pub fn resolve(&self, overrides: &RetrierOptions) -> Result<Self> {
        overrides.validate()?;

        let mut merged = self.clone();
        if let Some(title) = &overrides.title {
            merged.title = title.clone();
        }
        if let Some(max_attempts) = overrides.max_attempts {
            merged.max_attempts = max_attempts;
        }
        if let Some(delay_ms) = overrides.delay_ms {
            merged.delay_ms = delay_ms;
        }
        if let Some(exponential) = overrides.exponential {
            merged.exponential = exponential;
        }
        if let Some(return_json) = overrides.return_json {
            merged.return_json = return_json;
        }
        if let Some(retry_on) = &overrides.retry_on {
            merged.retry_on = Arc::clone(retry_on);
        }
        if let Some(log) = &overrides.log {
            merged.log = Arc::clone(log);
        }
        Ok(merged)
    }

    pub(crate) fn should_retry(&self, response: &NormalizedResponse) -> bool {
        (self.retry_on)(response)
    }
}

/// Partial settings; `None` leaves the base value untouched.
#[derive(Clone, Default)]
pub struct RetrierOptions {
    pub title: Option<String>,
    pub max_attempts: Option<u32>,
    pub delay_ms: Option<f64>,
    pub exponential: Option<bool>,
    pub return_json: Option<bool>,
    pub retry_on: Option<RetryOn>,
    pub log: Option<Logger>,
}

impl fmt::Debug for RetrierOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrierOptions")
            .field("title", &self.title)
            .field("max_attempts", &self.max_attempts)
            .field("delay_ms", &self.delay_ms)
            .field("exponential", &self.exponential)
            .field("return_json", &self.return_json)
            .field("retry_on", &self.retry_on.as_ref().map(|_| "<fn>"))
            .field("log", &self.log.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

impl RetrierOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn delay_ms(mut self, delay_ms: f64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    pub fn exponential(mut self, exponential: bool) -> Self {
        self.exponential = Some(exponential);
        self
    }

    pub fn return_json(mut self, return_json: bool) -> Self {
        self.return_json = Some(return_json);
        self
    }

    pub fn retry_on<F>(mut self, retry_on: F) -> Self
    where
        F: Fn(&NormalizedResponse) -> bool + Send + Sync + 'static,
    {
        self.retry_on = Some(Arc::new(retry_on));
        self
    }

    pub fn log<F>(mut self, log: F) -> Self
    where
        F: Fn(&AttemptLog<'_>) + Send + Sync + 'static,
    {
        self.log = Some(Arc::new(log));
        self
    }

    /// Checks the numeric constraints; types already guarantee the rest.
    pub fn validate(&self) -> Result<()> {
        if self.max_attempts == Some(0) {
            return Err(RetrierError::InvalidConfiguration {
                field: "maxAttempts",
                constraint: "must be greater than 0",
            });
        }
        if let Some(delay_ms) = self.delay_ms {
            if !delay_ms.is_finite() || delay_ms < 0.0 {
                return Err(RetrierError::InvalidConfiguration {
                    field: "delay",
                    constraint: "must be a finite, non-negative number",
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{NormalizedResponse, RetrierError, RetrierOptions, Settings};

    fn record_with_status(status: u16) -> NormalizedResponse {
        let mut record = NormalizedResponse::new("http://localhost/", None);
        record.status = status;
        record
    }

    #[test]
    fn defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.title, "Fetch Retrier");
        assert_eq!(settings.max_attempts, 1);
        assert_eq!(settings.delay_ms, 100.0);
        assert!(settings.exponential);
        assert!(settings.return_json);
        assert!(settings.should_retry(&record_with_status(500)));
        assert!(settings.should_retry(&record_with_status(599)));
        assert!(!settings.should_retry(&record_with_status(404)));
    }

    #[test]
    fn resolve_replaces_only_provided_fields() {
        let base = Settings::default();
        let merged = base
            .resolve(&RetrierOptions::new().max_attempts(4).exponential(false))
            .expect("must merge");

        assert_eq!(merged.max_attempts, 4);
        assert!(!merged.exponential);
        assert_eq!(merged.delay_ms, base.delay_ms);
        assert_eq!(merged.title, base.title);
        assert!(merged.return_json);
    }

    #[test]
    fn resolve_does_not_mutate_base() {
        let base = Settings::default();
        let _ = base
            .resolve(&RetrierOptions::new().max_attempts(9).title("other"))
            .expect("must merge");

        assert_eq!(base.max_attempts, 1);
        assert_eq!(base.title, "Fetch Retrier");
    }

    #[test]
    fn falsy_values_still_override() {
        let base = Settings::default();
        let merged = base
            .resolve(
                &RetrierOptions::new()
                    .delay_ms(0.0)
                    .exponential(false)
                    .return_json(false),
            )
            .expect("must merge");

        assert_eq!(merged.delay_ms, 0.0);
        assert!(!merged.exponential);
        assert!(!merged.return_json);
    }

    #[test]
    fn retry_predicate_override_is_used() {
        let merged = Settings::default()
            .resolve(&RetrierOptions::new().retry_on(|response| response.status == 404))
            .expect("must merge");

        assert!(merged.should_retry(&record_with_status(404)));
        assert!(!merged.should_retry(&record_with_status(500)));
    }

    #[test]
    fn zero_max_attempts_is_rejected() {
        let err = Settings::new(&RetrierOptions::new().max_attempts(0)).expect_err("must fail");
        assert!(matches!(
            err,
            RetrierError::InvalidConfiguration {
                field: "maxAttempts",
                ..
            }
        ));
    }

    #[test]
    fn negative_or_non_finite_delay_is_rejected() {
        for delay in [-1.0, f64::NAN, f64::INFINITY] {
            let err = Settings::new(&RetrierOptions::new().delay_ms(delay)).expect_err("must fail");
            assert!(matches!(
                err,
                RetrierError::InvalidConfiguration { field: "delay", .. }
            ));
        }
    }

    #[test]
    fn failed_merge_is_all_or_nothing() {
        let base = Settings::default();
        let result = base.resolve(&RetrierOptions::new().title("changed").delay_ms(-5.0));

        assert!(result.is_err());
        assert_eq!(base.title, "Fetch Retrier");
        assert_eq!(base.delay_ms, 100.0);
    }

    #[test]
    fn callables_are_shared_not_copied() {
        let options = RetrierOptions::new().log(|_| {});
        let merged = Settings::new(&options).expect("must merge");
        let original = options.log.expect("log must be set");
        assert!(Arc::ptr_eq(&merged.log, &original));
    }
}
