//! Rate-limited outbound request channels
//!
//! Each remote service gets its own [`RateLimiter`], shared through an `Arc` by every
//! [`RateLimitedClient`] that talks to it. Callers block until the limiter admits them;
//! nothing is dropped or retried.
//!
//! The limiter is a generic cell rate algorithm, which behaves like a token bucket of
//! `burst` tokens refilled one per `interval`. The internal lock is only taken to book a
//! slot; the wait itself happens outside it.

use crate::error::{Error, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Per-channel admission control
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    burst: u32,
    /// Theoretical arrival time of the next conforming request
    tat: Mutex<Option<Instant>>,
}

/// A booked admission slot
#[derive(Debug, Clone, Copy)]
struct Reservation {
    admit_at: Instant,
    prev_tat: Option<Instant>,
    new_tat: Instant,
}

impl RateLimiter {
    /// Create a limiter admitting one request per `interval`, with up to `burst`
    /// requests admitted back to back. A burst of 0 is treated as 1.
    pub fn new(interval: Duration, burst: u32) -> Self {
        Self {
            interval,
            burst: burst.max(1),
            tat: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn burst(&self) -> u32 {
        self.burst
    }

    fn state(&self) -> MutexGuard<'_, Option<Instant>> {
        // Reservation bookkeeping cannot be left half-done, so a poisoned lock is still usable.
        self.tat.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reserve(&self, now: Instant) -> Reservation {
        let mut tat = self.state();
        let prev_tat = *tat;
        let current = prev_tat.map_or(now, |t| t.max(now));
        let tolerance = self.interval * (self.burst - 1);
        let admit_at = current
            .checked_sub(tolerance)
            .map_or(now, |earliest| earliest.max(now));
        let new_tat = current + self.interval;
        *tat = Some(new_tat);
        Reservation {
            admit_at,
            prev_tat,
            new_tat,
        }
    }

    /// Give back a slot that was never used. Only the most recent booking can be
    /// returned; later bookings have already been spaced after it.
    fn cancel(&self, reservation: &Reservation, now: Instant) {
        if reservation.admit_at <= now {
            return;
        }
        let mut tat = self.state();
        if *tat == Some(reservation.new_tat) {
            *tat = reservation.prev_tat;
        }
    }

    /// Block until admitted.
    pub async fn wait(&self) -> Result<()> {
        self.wait_until(None).await
    }

    /// Block until admitted, failing immediately with [`Error::RateLimitCanceled`] if the
    /// admission slot would fall after `deadline`. A refused or abandoned wait does not
    /// consume its slot.
    pub async fn wait_until(&self, deadline: Option<Instant>) -> Result<()> {
        let now = Instant::now();
        if deadline.is_some_and(|deadline| deadline <= now) {
            return Err(Error::RateLimitCanceled);
        }
        let reservation = self.reserve(now);

        if let Some(deadline) = deadline {
            if reservation.admit_at > deadline {
                self.cancel(&reservation, now);
                log::debug!("Rate limiter slot is past the caller's deadline");
                return Err(Error::RateLimitCanceled);
            }
        }

        if reservation.admit_at > now {
            log::debug!(
                "Rate limiter: waiting {:?}",
                reservation.admit_at.duration_since(now)
            );
            let mut pending = Pending {
                limiter: self,
                reservation,
                armed: true,
            };
            tokio::time::sleep_until(reservation.admit_at).await;
            pending.armed = false;
        }
        Ok(())
    }
}

/// Returns the booked slot if the waiting future is dropped before admission.
struct Pending<'a> {
    limiter: &'a RateLimiter,
    reservation: Reservation,
    armed: bool,
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if self.armed {
            self.limiter.cancel(&self.reservation, Instant::now());
        }
    }
}

/// An HTTP client whose requests pass through a [`RateLimiter`] first
#[derive(Debug, Clone)]
pub struct RateLimitedClient {
    limiter: Arc<RateLimiter>,
    next: reqwest::Client,
    timeout: Option<Duration>,
}

impl RateLimitedClient {
    /// Wrap `next`, or a default client when none is given.
    pub fn new(limiter: Arc<RateLimiter>, next: Option<reqwest::Client>) -> Self {
        Self {
            limiter,
            next: next.unwrap_or_default(),
            timeout: None,
        }
    }

    /// Default timeout for requests that do not set their own.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Start building a request on the wrapped client.
    pub fn request(&self, method: reqwest::Method, url: &str) -> reqwest::RequestBuilder {
        self.next.request(method, url)
    }

    /// Wait for admission, then send `request` unchanged.
    ///
    /// The request's timeout is treated as the caller's deadline: if admission would come
    /// later than that, the request is never sent.
    pub async fn execute(&self, mut request: reqwest::Request) -> Result<reqwest::Response> {
        if request.timeout().is_none() {
            *request.timeout_mut() = self.timeout;
        }
        let deadline = request.timeout().map(|timeout| Instant::now() + *timeout);
        self.limiter.wait_until(deadline).await?;
        log::debug!("{} {}", request.method(), request.url());
        Ok(self.next.execute(request).await?)
    }
}

#[cfg(test)]
#[path = "rate_limit_tests.rs"]
mod tests;
