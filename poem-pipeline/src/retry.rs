use crate::llm_adapter::CompletionBackend;
use crate::types::RetryPolicy;
use backoff::backoff::Backoff;
use std::time::Duration;
use tracing::{error, info, warn};

/// Marker of a model declining to answer. Matched case-insensitively.
const REFUSAL_MARKER: &str = "i'm sorry";

pub fn is_refusal(text: &str) -> bool {
    text.to_lowercase().contains(REFUSAL_MARKER)
}

/// Bounded delay schedule: `linear` grows `step * n`, `constant` repeats
/// `step`. Yields `None` once `max` retries have been handed out.
#[derive(Debug, Clone)]
pub struct RetrySchedule {
    step: Duration,
    linear: bool,
    used: u32,
    max: u32,
}

impl RetrySchedule {
    pub fn linear(step: Duration, max: u32) -> Self {
        Self { step, linear: true, used: 0, max }
    }

    pub fn constant(step: Duration, max: u32) -> Self {
        Self { step, linear: false, used: 0, max }
    }

    pub fn retries_used(&self) -> u32 {
        self.used
    }
}

impl Backoff for RetrySchedule {
    fn reset(&mut self) {
        self.used = 0;
    }

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.used >= self.max {
            return None;
        }
        self.used += 1;
        Some(if self.linear { self.step * self.used } else { self.step })
    }
}

/// Completion calls with two independent retry budgets: one for transport
/// or service failures, one for apologetic answers. Exhausting either gives
/// `None`; callers pick their own fallback.
pub struct RetryingCaller<B> {
    backend: B,
    policy: RetryPolicy,
}

impl<B: CompletionBackend> RetryingCaller<B> {
    pub fn new(backend: B, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    pub async fn call(
        &self,
        context: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Option<String> {
        let mut failures =
            RetrySchedule::linear(self.policy.failure_step, self.policy.max_failure_retries);
        let mut refusals =
            RetrySchedule::constant(self.policy.refusal_delay, self.policy.max_refusal_retries);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            info!(
                context,
                attempt,
                backend = %self.backend.backend_name(),
                "Calling completion service"
            );

            let delay = match self.backend.complete(system_prompt, user_prompt).await {
                Ok(text) if is_refusal(&text) => match refusals.next_backoff() {
                    Some(delay) => {
                        warn!(
                            context,
                            retry = refusals.retries_used(),
                            "Model apologized, retrying"
                        );
                        delay
                    }
                    None => {
                        warn!(context, attempt, "Model kept apologizing, giving up");
                        return None;
                    }
                },
                Ok(text) => {
                    let text = text.trim();
                    return (!text.is_empty()).then(|| text.to_string());
                }
                Err(e) => match failures.next_backoff() {
                    Some(delay) => {
                        warn!(
                            context,
                            retry = failures.retries_used(),
                            "Completion failed, retrying in {:?}: {}",
                            delay,
                            e
                        );
                        delay
                    }
                    None => {
                        error!(context, attempt, "Completion failed, giving up: {}", e);
                        return None;
                    }
                },
            };

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_schedule_grows_by_step() {
        let mut schedule = RetrySchedule::linear(Duration::from_secs(2), 3);
        let delays: Vec<_> = std::iter::from_fn(|| schedule.next_backoff()).collect();
        assert_eq!(
            delays,
            vec![Duration::from_secs(2), Duration::from_secs(4), Duration::from_secs(6)]
        );
        schedule.reset();
        assert_eq!(schedule.next_backoff(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn constant_schedule_repeats() {
        let mut schedule = RetrySchedule::constant(Duration::from_secs(2), 3);
        let delays: Vec<_> = std::iter::from_fn(|| schedule.next_backoff()).collect();
        assert_eq!(delays, vec![Duration::from_secs(2); 3]);
        assert_eq!(schedule.retries_used(), 3);
    }

    #[test]
    fn refusal_detection_ignores_case() {
        assert!(is_refusal("I'm sorry, I can't help with that."));
        assert!(is_refusal("well... I'M SORRY"));
        assert!(!is_refusal("Sorry Moon"));
    }
}
