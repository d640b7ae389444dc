//! Order producers.
//!
//! A producer turns one faction's [`FactionView`] into that faction's
//! orders for the coming turn. The turn runner awaits both producers at
//! once and gives each a deadline; a producer that misses it is recorded
//! as timed out and its faction stands fast.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use warsim_core::catalog::Catalog;
use warsim_core::factions::FactionId;
use warsim_core::fog::FactionView;
use warsim_core::orders::OrdersPayload;

use crate::doctrine::{Doctrine, DoctrineError};

/// Something that writes a faction's orders.
pub trait OrderProducer: Send {
    /// Short label for logs and metrics.
    fn name(&self) -> String;

    /// Orders for the turn `view` is about to play.
    fn produce(&mut self, view: FactionView) -> impl Future<Output = OrdersPayload> + Send;
}

/// Never orders anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleProducer;

impl OrderProducer for IdleProducer {
    fn name(&self) -> String {
        "idle".to_string()
    }

    async fn produce(&mut self, view: FactionView) -> OrdersPayload {
        OrdersPayload::empty(view.faction, view.turn)
    }
}

/// Plays back payloads written ahead of time, keyed by turn.
///
/// Turns with no script entry get an empty payload.
#[derive(Debug, Clone, Default)]
pub struct ScriptedProducer {
    script: BTreeMap<u32, OrdersPayload>,
}

impl ScriptedProducer {
    /// Build from a list of payloads. A later payload for the same turn
    /// replaces an earlier one.
    #[must_use]
    pub fn new(payloads: impl IntoIterator<Item = OrdersPayload>) -> Self {
        Self {
            script: payloads.into_iter().map(|p| (p.turn, p)).collect(),
        }
    }

    /// Load a RON list of payloads.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DoctrineError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(DoctrineError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        let payloads: Vec<OrdersPayload> = ron::from_str(&contents)?;
        Ok(Self::new(payloads))
    }

    /// Number of scripted turns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.script.len()
    }

    /// Whether nothing is scripted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

impl OrderProducer for ScriptedProducer {
    fn name(&self) -> String {
        format!("scripted({})", self.script.len())
    }

    async fn produce(&mut self, view: FactionView) -> OrdersPayload {
        self.script
            .get(&view.turn)
            .cloned()
            .unwrap_or_else(|| OrdersPayload::empty(view.faction, view.turn))
    }
}

/// Writes orders with a [`Doctrine`].
#[derive(Debug, Clone)]
pub struct DoctrineProducer {
    doctrine: Doctrine,
    catalog: Arc<Catalog>,
}

impl DoctrineProducer {
    /// Create a producer fighting by `doctrine`.
    #[must_use]
    pub fn new(doctrine: Doctrine, catalog: Arc<Catalog>) -> Self {
        Self { doctrine, catalog }
    }

    /// The doctrine in use.
    #[must_use]
    pub fn doctrine(&self) -> &Doctrine {
        &self.doctrine
    }
}

impl OrderProducer for DoctrineProducer {
    fn name(&self) -> String {
        self.doctrine.name.to_ascii_lowercase()
    }

    async fn produce(&mut self, view: FactionView) -> OrdersPayload {
        self.doctrine.orders(&view, &self.catalog)
    }
}

/// Waits before handing over the inner producer's orders.
#[derive(Debug, Clone)]
pub struct Delayed<P> {
    inner: P,
    delay: Duration,
}

impl<P: OrderProducer> Delayed<P> {
    /// Wrap `inner`, adding `delay` to every turn.
    pub fn new(inner: P, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

impl<P: OrderProducer> OrderProducer for Delayed<P> {
    fn name(&self) -> String {
        format!("{}+{}ms", self.inner.name(), self.delay.as_millis())
    }

    async fn produce(&mut self, view: FactionView) -> OrdersPayload {
        tokio::time::sleep(self.delay).await;
        self.inner.produce(view).await
    }
}

/// A producer chosen at run time, for the CLI and batch runner.
#[derive(Debug, Clone)]
pub enum AnyProducer {
    /// See [`IdleProducer`].
    Idle(IdleProducer),
    /// See [`ScriptedProducer`].
    Scripted(ScriptedProducer),
    /// See [`DoctrineProducer`].
    Doctrine(DoctrineProducer),
}

impl AnyProducer {
    /// Build from a preset name: `idle`, a doctrine preset, or a path to a
    /// doctrine RON file.
    pub fn from_preset(preset: &str, catalog: &Arc<Catalog>) -> Result<Self, DoctrineError> {
        if preset.eq_ignore_ascii_case("idle") {
            return Ok(Self::Idle(IdleProducer));
        }
        let doctrine = if preset.ends_with(".ron") {
            Doctrine::load(preset)?
        } else {
            Doctrine::preset(preset)?
        };
        Ok(Self::Doctrine(DoctrineProducer::new(doctrine, Arc::clone(catalog))))
    }
}

impl OrderProducer for AnyProducer {
    fn name(&self) -> String {
        match self {
            Self::Idle(p) => p.name(),
            Self::Scripted(p) => p.name(),
            Self::Doctrine(p) => p.name(),
        }
    }

    async fn produce(&mut self, view: FactionView) -> OrdersPayload {
        match self {
            Self::Idle(p) => p.produce(view).await,
            Self::Scripted(p) => p.produce(view).await,
            Self::Doctrine(p) => p.produce(view).await,
        }
    }
}

/// Default preset per faction.
#[must_use]
pub const fn default_preset(faction: FactionId) -> &'static str {
    match faction {
        FactionId::Blue => "balanced",
        FactionId::Red => "offensive",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warsim_core::orders::{GroundMission, Order, Target};
    use warsim_core::hex::HexCoord;
    use warsim_test_utils::fixtures::frontline_engine;
    use warsim_core::config::EngineConfig;

    fn blue_view() -> (FactionView, Arc<Catalog>) {
        let engine = frontline_engine(7, EngineConfig::default());
        (engine.fog_view(FactionId::Blue), engine.shared_catalog())
    }

    #[tokio::test]
    async fn test_idle_orders_are_empty() {
        let (view, _) = blue_view();
        let orders = IdleProducer.produce(view).await;
        assert!(orders.is_empty());
        assert_eq!(orders.turn, 1);
        assert_eq!(orders.faction, FactionId::Blue);
    }

    #[tokio::test]
    async fn test_scripted_plays_matching_turn() {
        let (view, _) = blue_view();
        let unit = view.own_units[0].id;
        let mut scripted = OrdersPayload::empty(FactionId::Blue, 1);
        scripted
            .ground
            .push(Order::new(unit, GroundMission::Move, Target::Cell(HexCoord::new(1, 1))));
        let mut producer = ScriptedProducer::new([scripted.clone(), OrdersPayload::empty(FactionId::Blue, 3)]);
        assert_eq!(producer.len(), 2);

        assert_eq!(producer.produce(view.clone()).await, scripted);

        let mut later = view;
        later.turn = 2;
        assert!(producer.produce(later).await.is_empty());
    }

    #[tokio::test]
    async fn test_doctrine_producer_orders_ground_units() {
        let (view, catalog) = blue_view();
        let ground = view
            .own_units
            .iter()
            .filter(|u| u.domain == warsim_core::unit::Domain::Ground)
            .count();
        let mut producer = DoctrineProducer::new(Doctrine::balanced(), catalog);
        let orders = producer.produce(view).await;
        assert_eq!(orders.ground.len(), ground);
        assert_eq!(producer.name(), "balanced");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_waits() {
        let (view, _) = blue_view();
        let mut producer = Delayed::new(IdleProducer, Duration::from_secs(30));
        let started = tokio::time::Instant::now();
        let orders = producer.produce(view).await;
        assert!(orders.is_empty());
        assert!(started.elapsed() >= Duration::from_secs(30));
    }

    #[test]
    fn test_presets() {
        let catalog = Arc::new(Catalog::standard());
        assert!(matches!(AnyProducer::from_preset("idle", &catalog), Ok(AnyProducer::Idle(_))));
        assert!(matches!(
            AnyProducer::from_preset("Defensive", &catalog),
            Ok(AnyProducer::Doctrine(_))
        ));
        assert!(AnyProducer::from_preset("reckless", &catalog).is_err());
        assert!(matches!(
            AnyProducer::from_preset("missing.ron", &catalog),
            Err(DoctrineError::FileNotFound(_))
        ));
        assert_eq!(default_preset(FactionId::Red), "offensive");
    }

    #[test]
    fn test_scripted_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.ron");
        std::fs::write(&path, "[(faction: Red, turn: 2), (faction: Red, turn: 4)]").unwrap();
        let producer = ScriptedProducer::load(&path).unwrap();
        assert_eq!(producer.len(), 2);
    }
}
