//! circuit_breaker.rs
//!
//! Паттерн "Автоматический выключатель" для вызовов внешнего сервиса мест.
//! После серии сбоев запросы временно не отправляются, а затем пропускается
//! один пробный запрос для проверки, восстановился ли сервис.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info, warn};

/// Состояния выключателя.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// **Closed**: нормальный режим, запросы разрешены.
    Closed,
    /// **Open**: после множественных сбоев запросы блокируются до таймаута.
    Open,
    /// **HalfOpen**: таймаут истёк, разрешён один пробный запрос.
    HalfOpen,
}

/// Решение о пропуске запроса.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Admission {
    Denied,
    Allowed,
    Probe,
}

/// Освобождает слот пробного запроса, даже если future была отменена.
struct ProbeSlot<'a>(&'a AtomicBool);

impl Drop for ProbeSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    #[error("circuit breaker is open - service temporarily unavailable")]
    Open,
    #[error(transparent)]
    Inner(E),
}

#[derive(Debug)]
pub struct CircuitBreaker {
    state: RwLock<CircuitState>,
    /// Счётчик последовательных сбоев.
    failure_count: AtomicU32,
    last_failure: Mutex<Option<Instant>>,
    /// Пробный запрос в HalfOpen уже выполняется.
    probe_in_flight: AtomicBool,
    failure_threshold: u32,
    timeout_duration: Duration,
}

impl CircuitBreaker {
    pub fn new(failure_threshold: u32, timeout_seconds: u64) -> Self {
        Self {
            state: RwLock::new(CircuitState::Closed),
            failure_count: AtomicU32::new(0),
            last_failure: Mutex::new(None),
            probe_in_flight: AtomicBool::new(false),
            failure_threshold: failure_threshold.max(1),
            timeout_duration: Duration::from_secs(timeout_seconds),
        }
    }

    /// Можно ли выполнить следующий запрос. В HalfOpen `true` получает
    /// только тот, кто занял слот пробного запроса.
    pub fn can_execute(&self) -> bool {
        self.admit() != Admission::Denied
    }

    fn admit(&self) -> Admission {
        match self.state() {
            CircuitState::Closed => Admission::Allowed,
            CircuitState::HalfOpen => self.claim_probe(),
            CircuitState::Open => {
                let last_failure = *self.last_failure.lock().unwrap_or_else(|e| e.into_inner());
                let timed_out = last_failure.map_or(true, |at| at.elapsed() >= self.timeout_duration);
                if !timed_out {
                    return Admission::Denied;
                }

                {
                    let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
                    if *state == CircuitState::Open {
                        *state = CircuitState::HalfOpen;
                        info!("Circuit breaker transitioning to HalfOpen state");
                    }
                }
                self.claim_probe()
            }
        }
    }

    fn claim_probe(&self) -> Admission {
        match self
            .probe_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Admission::Probe,
            Err(_) => Admission::Denied,
        }
    }

    pub fn record_success(&self) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if *state == CircuitState::HalfOpen {
            *state = CircuitState::Closed;
            info!("Circuit breaker recovered - transitioning to Closed state");
        }
        self.failure_count.store(0, Ordering::Relaxed);
        self.probe_in_flight.store(false, Ordering::Release);
    }

    pub fn record_failure(&self) {
        let failure_count = self.failure_count.fetch_add(1, Ordering::Relaxed) + 1;
        *self.last_failure.lock().unwrap_or_else(|e| e.into_inner()) = Some(Instant::now());

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        match *state {
            CircuitState::Closed if failure_count >= self.failure_threshold => {
                *state = CircuitState::Open;
                error!(
                    failures = failure_count,
                    threshold = self.failure_threshold,
                    "Circuit breaker OPENED"
                );
            }
            CircuitState::HalfOpen => {
                *state = CircuitState::Open;
                warn!("Circuit breaker probe failed - returning to Open state");
            }
            _ => {}
        }
        self.probe_in_flight.store(false, Ordering::Release);
    }

    /// Текущее состояние для мониторинга.
    pub fn state(&self) -> CircuitState {
        *self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Выполняет операцию через выключатель, учитывая её результат.
    pub async fn call<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: std::future::Future<Output = Result<T, E>>,
    {
        let _probe = match self.admit() {
            Admission::Denied => {
                warn!("Circuit breaker is OPEN - blocking request");
                return Err(CircuitBreakerError::Open);
            }
            Admission::Allowed => None,
            Admission::Probe => Some(ProbeSlot(&self.probe_in_flight)),
        };

        match operation.await {
            Ok(result) => {
                self.record_success();
                Ok(result)
            }
            Err(e) => {
                self.record_failure();
                Err(CircuitBreakerError::Inner(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_after_threshold() {
        let breaker = CircuitBreaker::new(3, 60);
        breaker.record_failure();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.can_execute());
    }

    #[test]
    fn success_resets_failure_count() {
        let breaker = CircuitBreaker::new(2, 60);
        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_after_timeout_then_recovers() {
        let breaker = CircuitBreaker::new(1, 0);
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);

        assert!(breaker.can_execute());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.record_success();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[test]
    fn half_open_admits_a_single_probe() {
        let breaker = CircuitBreaker::new(1, 0);
        breaker.record_failure();

        assert!(breaker.can_execute());
        assert!(!breaker.can_execute());
        assert!(!breaker.can_execute());

        breaker.record_success();
        assert!(breaker.can_execute());
        assert!(breaker.can_execute());
    }

    #[tokio::test]
    async fn cancelled_probe_frees_the_slot() {
        let breaker = CircuitBreaker::new(1, 0);
        breaker.record_failure();

        let pending = breaker.call(std::future::pending::<Result<(), &str>>());
        let timed_out = tokio::time::timeout(Duration::from_millis(10), pending).await;
        assert!(timed_out.is_err());

        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        assert!(breaker.can_execute());
    }

    #[test]
    fn failed_probe_reopens() {
        let breaker = CircuitBreaker::new(1, 0);
        breaker.record_failure();
        assert!(breaker.can_execute());
        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn call_short_circuits_when_open() {
        let breaker = CircuitBreaker::new(1, 60);
        let failed: Result<(), CircuitBreakerError<&str>> = breaker.call(async { Err("boom") }).await;
        assert!(matches!(failed, Err(CircuitBreakerError::Inner("boom"))));

        let blocked: Result<u8, CircuitBreakerError<&str>> = breaker.call(async { Ok(1) }).await;
        assert!(matches!(blocked, Err(CircuitBreakerError::Open)));
    }
}
