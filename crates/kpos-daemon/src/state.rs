//! Shared runtime state for kpos-daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from Axum. The engine crates are
//! synchronous and lock-free; this module supplies the single-writer
//! discipline around them (one sessions lock, held for the whole of a
//! mutation, so two requests on one cart never interleave).

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use kpos_cart::{Cart, CartStore, PersistError};
use kpos_catalog::{CatalogError, CatalogSnapshot, CatalogSource};
use kpos_config::EngineSettings;
use kpos_order::Order;
use kpos_readiness::CookedStock;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// BuildInfo
// ---------------------------------------------------------------------------

/// Static build metadata included in health responses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A live kiosk session. `last_touched` drives idle expiry.
#[derive(Clone, Debug)]
pub struct Session {
    pub cart: Cart,
    pub last_touched: Instant,
}

// ---------------------------------------------------------------------------
// OrderEntry
// ---------------------------------------------------------------------------

/// A placed order as held by the daemon. `settled_at` is set when the order
/// first reaches a terminal status; settled orders are swept after one idle
/// timeout.
#[derive(Clone, Debug)]
pub struct OrderEntry {
    pub order: Order,
    pub settled_at: Option<Instant>,
}

impl OrderEntry {
    pub fn new(order: Order) -> Self {
        Self {
            order,
            settled_at: None,
        }
    }

    /// Stamp `settled_at` once the order is terminal. Later calls keep the
    /// first stamp.
    pub fn note_status(&mut self, now: Instant) {
        if self.order.status().is_terminal() && self.settled_at.is_none() {
            self.settled_at = Some(now);
        }
    }
}

pub type SharedCatalogSource = Arc<dyn CatalogSource + Send + Sync>;
pub type SharedCartStore = Arc<dyn CartStore + Send + Sync>;

// ---------------------------------------------------------------------------
// AppState
// ---------------------------------------------------------------------------

pub struct AppState {
    pub build: BuildInfo,
    pub settings: EngineSettings,
    catalog_source: SharedCatalogSource,
    /// Last snapshot that loaded completely. `None` until the first good
    /// load; a failed reload keeps the previous one.
    pub catalog: RwLock<Option<Arc<CatalogSnapshot>>>,
    pub sessions: Mutex<HashMap<String, Session>>,
    pub cart_store: SharedCartStore,
    pub orders: RwLock<HashMap<Uuid, OrderEntry>>,
    /// Written by the kitchen, read by readiness. No reservation.
    pub stock: RwLock<CookedStock>,
}

impl AppState {
    pub fn new(
        settings: EngineSettings,
        catalog_source: SharedCatalogSource,
        cart_store: SharedCartStore,
    ) -> Self {
        Self {
            build: BuildInfo {
                service: "kpos-daemon",
                version: env!("CARGO_PKG_VERSION"),
            },
            settings,
            catalog_source,
            catalog: RwLock::new(None),
            sessions: Mutex::new(HashMap::new()),
            cart_store,
            orders: RwLock::new(HashMap::new()),
            stock: RwLock::new(CookedStock::new()),
        }
    }

    /// Fetch both catalog reads and swap in the new snapshot. On error the
    /// previous snapshot stays in place. Sources do blocking IO, so the load
    /// runs on the blocking pool.
    pub async fn reload_catalog(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        let source = Arc::clone(&self.catalog_source);
        let loaded = tokio::task::spawn_blocking(move || CatalogSnapshot::load(source.as_ref()))
            .await
            .unwrap_or_else(|e| {
                Err(CatalogError::Unavailable {
                    what: "catalog",
                    detail: format!("load task failed: {e}"),
                })
            });
        match loaded {
            Ok(snap) => {
                let snap = Arc::new(snap);
                info!(
                    meal_types = snap.meal_types().count(),
                    recipes = snap.recipes().count(),
                    "catalog snapshot loaded"
                );
                *self.catalog.write().await = Some(Arc::clone(&snap));
                Ok(snap)
            }
            Err(e) => {
                warn!(error = %e, "catalog load failed; keeping previous snapshot");
                Err(e)
            }
        }
    }

    pub async fn catalog_snapshot(&self) -> Option<Arc<CatalogSnapshot>> {
        self.catalog.read().await.clone()
    }
}

/// The session's cart, loading it from the store (or starting empty) on
/// first touch. Marks the session as touched.
pub fn session_entry<'a>(
    sessions: &'a mut HashMap<String, Session>,
    store: &dyn CartStore,
    session_id: &str,
    now: Instant,
) -> Result<&'a mut Session, PersistError> {
    let session = match sessions.entry(session_id.to_string()) {
        Entry::Occupied(e) => e.into_mut(),
        Entry::Vacant(e) => {
            let cart = store.load(session_id)?.unwrap_or_default();
            e.insert(Session {
                cart,
                last_touched: now,
            })
        }
    };
    session.last_touched = now;
    Ok(session)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Monotonically increasing uptime since first call (process lifetime).
pub fn uptime_secs() -> u64 {
    static START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();
    START.get_or_init(Instant::now).elapsed().as_secs()
}

/// Drop every session idle for longer than `timeout` as of `now`, clearing
/// its stored cart too. Returns the expired session ids.
pub async fn sweep_idle(state: &AppState, now: Instant, timeout: Duration) -> Vec<String> {
    let mut sessions = state.sessions.lock().await;
    let expired: Vec<String> = sessions
        .iter()
        .filter(|(_, s)| now.saturating_duration_since(s.last_touched) > timeout)
        .map(|(id, _)| id.clone())
        .collect();

    for id in &expired {
        sessions.remove(id);
        if let Err(e) = state.cart_store.remove(id) {
            warn!(session_id = %id, error = %e, "failed to remove expired cart");
        }
    }
    if !expired.is_empty() {
        info!(expired = expired.len(), "idle sessions cleared");
    }
    expired
}

/// Drop every order settled for longer than `retain` as of `now`. Open
/// orders are never swept. Returns the dropped order ids.
pub async fn sweep_settled_orders(state: &AppState, now: Instant, retain: Duration) -> Vec<Uuid> {
    let mut orders = state.orders.write().await;
    let settled: Vec<Uuid> = orders
        .iter()
        .filter(|(_, e)| {
            e.settled_at
                .is_some_and(|at| now.saturating_duration_since(at) > retain)
        })
        .map(|(id, _)| *id)
        .collect();

    for id in &settled {
        orders.remove(id);
    }
    if !settled.is_empty() {
        info!(dropped = settled.len(), "settled orders cleared");
    }
    settled
}

/// Spawn a background task that expires idle sessions and settled orders
/// every `interval`. Does nothing when the configured idle timeout is `0`.
pub fn spawn_idle_sweep(state: Arc<AppState>, interval: Duration) {
    let timeout_secs = state.settings.idle_timeout_secs;
    if timeout_secs == 0 {
        info!("idle session expiry disabled");
        return;
    }
    let timeout = Duration::from_secs(timeout_secs);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let now = Instant::now();
            sweep_idle(&state, now, timeout).await;
            sweep_settled_orders(&state, now, timeout).await;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::Utc;
    use kpos_cart::{IndividualItem, MemoryCartStore};
    use kpos_catalog::{fixtures, MealTypeRecord, RecipeRecord, StaticCatalogSource};
    use kpos_order::{place_order, KitchenEvent};
    use kpos_pricing::PricingPolicy;

    /// Serves the fixture menu until `down` is set.
    struct FlakySource {
        inner: StaticCatalogSource,
        down: AtomicBool,
    }

    impl CatalogSource for FlakySource {
        fn fetch_meal_types(&self) -> Result<Vec<MealTypeRecord>, CatalogError> {
            self.inner.fetch_meal_types()
        }

        fn fetch_recipes(&self) -> Result<Vec<RecipeRecord>, CatalogError> {
            if self.down.load(Ordering::SeqCst) {
                return Err(CatalogError::Unavailable {
                    what: "recipes",
                    detail: "connection refused".to_string(),
                });
            }
            self.inner.fetch_recipes()
        }
    }

    fn flaky() -> Arc<FlakySource> {
        let (meals, recipes) = fixtures::snapshot().to_records();
        Arc::new(FlakySource {
            inner: StaticCatalogSource::new(meals, recipes),
            down: AtomicBool::new(false),
        })
    }

    fn state_with(source: SharedCatalogSource) -> AppState {
        AppState::new(
            EngineSettings::default(),
            source,
            Arc::new(MemoryCartStore::new()),
        )
    }

    #[tokio::test]
    async fn sweep_removes_only_idle_sessions() {
        let st = state_with(flaky());
        let t0 = Instant::now();
        {
            let mut sessions = st.sessions.lock().await;
            session_entry(&mut sessions, st.cart_store.as_ref(), "old", t0).unwrap();
            session_entry(
                &mut sessions,
                st.cart_store.as_ref(),
                "fresh",
                t0 + Duration::from_secs(100),
            )
            .unwrap();
        }
        let expired = sweep_idle(&st, t0 + Duration::from_secs(120), Duration::from_secs(60)).await;
        assert_eq!(expired, vec!["old".to_string()]);
        assert!(st.sessions.lock().await.contains_key("fresh"));
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_snapshot() {
        let source = flaky();
        let st = state_with(source.clone());
        assert!(st.catalog_snapshot().await.is_none());

        st.reload_catalog().await.unwrap();
        source.down.store(true, Ordering::SeqCst);
        let err = st.reload_catalog().await.unwrap_err();
        assert!(err.is_unavailable());

        let snap = st.catalog_snapshot().await.unwrap();
        assert!(snap.meal_type(fixtures::BOWL).is_some());
    }

    fn placed_order() -> Order {
        let snap = fixtures::snapshot();
        let rangoon = snap.recipe(fixtures::RANGOON).unwrap();
        let cart = Cart::from_lines(vec![], vec![IndividualItem::of(rangoon, 1)]);
        place_order(&cart, &snap, &PricingPolicy::default(), Utc::now(), Uuid::new_v4()).unwrap()
    }

    #[tokio::test]
    async fn sweep_drops_only_long_settled_orders() {
        let st = state_with(flaky());
        let t0 = Instant::now();

        let open = OrderEntry::new(placed_order());
        let mut done = OrderEntry::new(placed_order());
        done.order.apply(KitchenEvent::Cancel).unwrap();
        done.note_status(t0);
        let mut just_done = OrderEntry::new(placed_order());
        just_done.order.apply(KitchenEvent::Cancel).unwrap();
        just_done.note_status(t0 + Duration::from_secs(100));

        let (open_id, done_id, just_id) =
            (open.order.id(), done.order.id(), just_done.order.id());
        {
            let mut orders = st.orders.write().await;
            orders.insert(open_id, open);
            orders.insert(done_id, done);
            orders.insert(just_id, just_done);
        }

        let dropped =
            sweep_settled_orders(&st, t0 + Duration::from_secs(120), Duration::from_secs(60)).await;
        assert_eq!(dropped, vec![done_id]);
        let orders = st.orders.read().await;
        assert!(orders.contains_key(&open_id));
        assert!(orders.contains_key(&just_id));
    }

    #[test]
    fn settled_stamp_is_kept_from_first_terminal_status() {
        let t0 = Instant::now();
        let mut e = OrderEntry::new(placed_order());
        e.note_status(t0);
        assert!(e.settled_at.is_none());
        e.order.apply(KitchenEvent::Cancel).unwrap();
        e.note_status(t0 + Duration::from_secs(5));
        e.note_status(t0 + Duration::from_secs(9));
        assert_eq!(e.settled_at, Some(t0 + Duration::from_secs(5)));
    }
}
