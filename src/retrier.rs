use std::fmt;

use crate::{
    backoff::wait_for, AttemptLog, FetchError, NormalizedResponse, Request, ReqwestTransport,
    Result, RetrierOptions, Settings, Transport,
};

/// Creates a [`Retrier`] over `reqwest` with `options` applied to the defaults.
pub fn create_retrier(options: RetrierOptions) -> Result<Retrier> {
    Retrier::new(options)
}

/// Retrying HTTP helper.
///
/// Each call to [`Retrier::fetch`] owns its attempt counter and record, so a
/// single retrier can serve concurrent calls without locking.
#[derive(Clone)]
pub struct Retrier<T = ReqwestTransport> {
    transport: T,
    settings: Settings,
}

impl<T> fmt::Debug for Retrier<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Retrier")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl Retrier<ReqwestTransport> {
    /// Creates a retrier backed by a default `reqwest` client.
    pub fn new(options: RetrierOptions) -> Result<Self> {
        Self::with_transport(ReqwestTransport::new(), options)
    }
}

impl<T: Transport> Retrier<T> {
    /// Creates a retrier issuing requests through `transport`.
    pub fn with_transport(transport: T, options: RetrierOptions) -> Result<Self> {
        Ok(Self {
            transport,
            settings: Settings::new(&options)?,
        })
    }

    /// Default settings applied to every call.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Issues `request` against `url`, retrying per the effective settings.
    ///
    /// HTTP errors, transport failures and body decode failures are folded
    /// into the returned record. Only invalid per-call overrides fail.
    pub async fn fetch(&self, url: &str, request: Request) -> Result<NormalizedResponse> {
        let settings = match &request.retrier_options {
            Some(overrides) => self.settings.resolve(overrides)?,
            None => self.settings.clone(),
        };

        let template = NormalizedResponse::new(url, request.body.clone());
        let mut attempt = 0u32;

        let record = loop {
            attempt += 1;
            wait_for(attempt, settings.delay_ms, settings.exponential).await;

            let outcome = match self.transport.fetch(url, &request).await {
                Ok(raw) => template
                    .populate(raw, settings.return_json)
                    .map_err(FetchError::from),
                Err(err) => Err(FetchError::from(err)),
            };

            let record = match outcome {
                Ok(response) => response,
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(title = %settings.title, attempt, error = %err, "attempt failed");

                    template.populate_failure(err)
                }
            }
            .with_attempt(attempt);

            #[cfg(feature = "tracing")]
            tracing::debug!(
                title = %settings.title,
                attempt,
                status = record.status,
                url = %record.url,
                "attempt finished"
            );

            (settings.log)(&AttemptLog {
                title: &settings.title,
                attempt,
                response: &record,
            });

            if !settings.should_retry(&record) || attempt >= settings.max_attempts {
                break record;
            }
        };

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use crate::{create_retrier, RetrierError, RetrierOptions};

    #[test]
    fn factory_exposes_resolved_settings() {
        let retrier = create_retrier(RetrierOptions::new().max_attempts(3).title("svc"))
            .expect("must build");
        assert_eq!(retrier.settings().max_attempts, 3);
        assert_eq!(retrier.settings().title, "svc");
        assert_eq!(retrier.settings().delay_ms, 100.0);
    }

    #[test]
    fn factory_rejects_invalid_settings() {
        let err = create_retrier(RetrierOptions::new().max_attempts(0)).expect_err("must fail");
        assert!(matches!(err, RetrierError::InvalidConfiguration { .. }));
    }

    #[test]
    fn debug_hides_transport_and_callables() {
        let retrier = create_retrier(RetrierOptions::new()).expect("must build");
        let debug = format!("{retrier:?}");
        assert!(debug.contains("Fetch Retrier"));
        assert!(debug.contains("<fn>"));
    }
}
