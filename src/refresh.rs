//! Access token lifecycle: cache lookups, singleflight refreshes, and bounded retries.
//!
//! [`RefreshCoordinator::ensure_token`] answers from the [`TokenCache`] whenever the cached
//! snapshot is still valid. Otherwise it takes the coordinator lock, re-checks the cache, and
//! either joins the refresh already in flight or publishes a new one. A refresh is a single
//! shared future: every concurrent caller awaits the same token endpoint exchange and sees
//! the same token or the same [`TokenRefreshError`]. The refresh stores its result and
//! clears the in-flight handle under the lock that published it, so the next expiry always
//! starts a fresh exchange.
//!
//! Dropping a caller's future never cancels a refresh other callers depend on. The in-flight
//! handle keeps the exchange alive until some caller drives it to completion.

mod metrics;

pub use metrics::RefreshMetrics;

// std
use std::sync::Weak;
// crates.io
use futures::future::{BoxFuture, FutureExt, Shared};
// self
use crate::{
	_prelude::*,
	auth::{CachedToken, Credentials, TokenCache},
	error::TokenRefreshError,
	http::HttpTransport,
	oauth,
	obs::{self, OperationKind, OperationOutcome},
	policy::RefreshPolicy,
};

type RefreshOutput = Result<Arc<CachedToken>, Arc<TokenRefreshError>>;
type SharedRefresh = Shared<BoxFuture<'static, RefreshOutput>>;

#[derive(Default)]
struct RefreshState {
	cache: TokenCache,
	in_flight: Mutex<Option<SharedRefresh>>,
}

/// Owns the cached access token and serializes its refreshes.
pub struct RefreshCoordinator<T>
where
	T: ?Sized + HttpTransport,
{
	transport: Arc<T>,
	credentials: Arc<Credentials>,
	policy: RefreshPolicy,
	state: Arc<RefreshState>,
	metrics: Arc<RefreshMetrics>,
}
impl<T> RefreshCoordinator<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a coordinator with a cold cache.
	pub fn new(
		transport: impl Into<Arc<T>>,
		credentials: Credentials,
		policy: RefreshPolicy,
	) -> Result<Self> {
		policy.validate()?;

		Ok(Self {
			transport: transport.into(),
			credentials: Arc::new(credentials),
			policy,
			state: Default::default(),
			metrics: Default::default(),
		})
	}

	/// Returns a token that is valid now, refreshing it first if needed.
	pub async fn ensure_token(&self) -> Result<Arc<CachedToken>> {
		self.acquire().await.map_err(Error::from)
	}

	/// Same as [`ensure_token`](Self::ensure_token) but keeps the shared failure intact.
	pub(crate) async fn acquire(&self) -> RefreshOutput {
		if let Some(token) = self.state.cache.valid_at(OffsetDateTime::now_utc()) {
			return Ok(token);
		}

		let refresh = {
			let mut in_flight = self.state.in_flight.lock();

			if let Some(token) = self.state.cache.valid_at(OffsetDateTime::now_utc()) {
				return Ok(token);
			}

			match in_flight.as_ref() {
				Some(refresh) => {
					self.metrics.record_join();
					obs::singleflight_join();

					refresh.clone()
				},
				None => {
					let refresh = self.start_refresh();

					*in_flight = Some(refresh.clone());

					refresh
				},
			}
		};

		refresh.await
	}

	/// Returns `true` iff the cached token is valid at `now`.
	pub fn is_valid(&self, now: OffsetDateTime) -> bool {
		self.state.cache.is_valid(now)
	}

	/// Returns the cached token snapshot, valid or not.
	pub fn cached_token(&self) -> Option<Arc<CachedToken>> {
		self.state.cache.snapshot()
	}

	/// Drops the cached token so the next caller refreshes.
	///
	/// A refresh already in flight is left running and will repopulate the cache.
	pub fn invalidate(&self) {
		let _in_flight = self.state.in_flight.lock();

		self.state.cache.clear();
	}

	/// Refresh counters for this coordinator.
	pub fn metrics(&self) -> &RefreshMetrics {
		&self.metrics
	}

	/// Policy in effect.
	pub fn policy(&self) -> &RefreshPolicy {
		&self.policy
	}

	/// Credentials presented to the token endpoint.
	pub fn credentials(&self) -> &Credentials {
		&self.credentials
	}

	fn start_refresh(&self) -> SharedRefresh {
		run_refresh(
			self.transport.clone(),
			self.credentials.clone(),
			self.policy,
			Arc::downgrade(&self.state),
			self.metrics.clone(),
		)
		.boxed()
		.shared()
	}
}
impl<T> Clone for RefreshCoordinator<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			credentials: self.credentials.clone(),
			policy: self.policy,
			state: self.state.clone(),
			metrics: self.metrics.clone(),
		}
	}
}
impl<T> Debug for RefreshCoordinator<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator")
			.field("credentials", &self.credentials)
			.field("policy", &self.policy)
			.field("cached_token", &self.state.cache.snapshot())
			.finish()
	}
}

// The state is held weakly so an abandoned refresh cannot keep a dropped coordinator alive
// through the in-flight handle.
async fn run_refresh<T>(
	transport: Arc<T>,
	credentials: Arc<Credentials>,
	policy: RefreshPolicy,
	state: Weak<RefreshState>,
	metrics: Arc<RefreshMetrics>,
) -> RefreshOutput
where
	T: ?Sized + HttpTransport,
{
	let span = obs::start(OperationKind::TokenRefresh, "refresh");

	metrics.record_refresh();

	let result = span
		.instrument(fetch_with_retry(&*transport, &credentials, policy, &metrics))
		.await
		.map(Arc::new)
		.map_err(Arc::new);

	if let Some(state) = state.upgrade() {
		let mut in_flight = state.in_flight.lock();

		if let Ok(token) = &result {
			state.cache.replace(token.clone());
		}

		*in_flight = None;
	}

	if obs::finish(OperationKind::TokenRefresh, &result) == OperationOutcome::Succeeded {
		metrics.record_success();
	} else {
		metrics.record_failure();
	}

	result
}

async fn fetch_with_retry<T>(
	transport: &T,
	credentials: &Credentials,
	policy: RefreshPolicy,
	metrics: &RefreshMetrics,
) -> Result<CachedToken, TokenRefreshError>
where
	T: ?Sized + HttpTransport,
{
	let max_attempts = policy.max_retries();
	let mut attempt = 0;

	loop {
		attempt += 1;
		metrics.record_attempt();

		let cause =
			match oauth::request_token(transport, credentials, policy.refresh_offset()).await {
				Ok(token) => return Ok(token),
				Err(cause) => cause,
			};

		if !cause.is_retryable() || attempt >= max_attempts {
			return Err(TokenRefreshError { attempts: attempt, cause });
		}

		let delay = policy.backoff(attempt - 1);

		obs::refresh_retry(attempt, max_attempts, delay, &cause);
		tokio::time::sleep(delay).await;
	}
}
