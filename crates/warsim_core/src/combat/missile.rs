//! Surface-to-surface missile strikes against air-defense queues.

use crate::catalog::Catalog;
use crate::combat::{
    covering_air_defense, interceptor_capacity, interceptor_use, CombatOutcome, Engagement,
    EngagementDetail, EngagementKind, Footprint, Resolution, ResolveContext, Resolver, StateDelta,
};
use crate::effects::EffectKind;
use crate::error::Result;
use crate::math::{as_percent, clamp_hit_chance, fx, pct, ratio, to_count, Fixed};
use crate::orders::Target;
use crate::rng::TurnRng;
use crate::unit::{Domain, LossCause, UnitId};
use crate::world::WorldState;

/// Hardness of a supply node against warheads.
const NODE_HARDNESS: u32 = 800;

/// Missile phase resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissileResolver;

impl Resolver for MissileResolver {
    fn footprint(&self, engagement: &Engagement, world: &WorldState, catalog: &Catalog) -> Footprint {
        let mut footprint = Footprint::of(engagement.participants());
        if let EngagementKind::Missile(order) = &engagement.kind {
            if let Some(at) = order.target.location(world) {
                let defenders = covering_air_defense(world, catalog, engagement.faction.opponent(), at);
                footprint.extend(defenders.iter().map(|(u, _)| u.id));
            }
        }
        footprint
    }

    fn resolve(&self, engagement: &Engagement, ctx: &ResolveContext<'_>, rng: &mut TurnRng) -> Result<Resolution> {
        let EngagementKind::Missile(order) = &engagement.kind else {
            return Err(ctx.wrong_kind(engagement));
        };
        let (battery, spec) = ctx.issuer(engagement, Domain::Missile)?;
        let stats = spec.missile.as_ref().ok_or_else(|| ctx.wrong_kind(engagement))?;
        let defender = engagement.faction.opponent();

        let (at, hardness, target_unit) = match order.target {
            Target::Unit(id) => {
                let target = ctx.target(id)?;
                (target.position, ctx.platform(target)?.hardness, Some(target))
            }
            Target::SupplyNode(id) => {
                let node = ctx.world.node(id).ok_or_else(|| ctx.wrong_kind(engagement))?;
                (node.position, NODE_HARDNESS, None)
            }
            Target::Cell(_) | Target::Area { .. } => return Err(ctx.wrong_kind(engagement)),
        };

        let fired = order.quantity_or(stats.salvo).min(battery.missiles);

        // Interceptor queue: longest-range defenders first, each limited by
        // free channels and interceptors in stock.
        let jam = ctx.effects.level(defender, EffectKind::RadarJam);
        let tracking = (pct(i64::from(stats.detectability)) * pct(150)).min(Fixed::ONE);
        let mut queue: Vec<(UnitId, Fixed, u32)> = Vec::new();
        for (unit, _) in covering_air_defense(ctx.world, ctx.catalog, defender, at) {
            let ad_spec = ctx.platform(unit)?;
            let capacity = interceptor_capacity(unit, ad_spec);
            if let (Some(ad), true) = (&ad_spec.air_defense, capacity > 0) {
                let pk = pct(i64::from(ad.interceptor_pk)) * (Fixed::ONE - jam * pct(50)) * tracking;
                queue.push((unit.id, pk, capacity));
            }
        }

        let mut deltas = Vec::new();
        let mut shots = vec![0u32; queue.len()];
        let mut slot = 0;
        let mut engaged = 0;
        let mut intercepted = 0;
        let mut leakers = 0;
        for _ in 0..fired {
            while slot < queue.len() && shots[slot] >= queue[slot].2 {
                slot += 1;
            }
            if slot < queue.len() {
                shots[slot] += 1;
                engaged += 1;
                if rng.chance(queue[slot].1) {
                    intercepted += 1;
                    continue;
                }
            }
            leakers += 1;
        }
        for ((unit, _, _), used) in queue.iter().zip(&shots) {
            interceptor_use(*unit, *used, &mut deltas);
        }

        let mut accuracy = pct(i64::from(stats.accuracy)) * ctx.env.weather.air_ops();
        if stats.gps_guided {
            accuracy *= Fixed::ONE - ctx.effects.level(defender, EffectKind::GpsJam) * pct(50);
        }
        let hit_chance = clamp_hit_chance(accuracy);
        let mut hits = 0;
        let mut damage = Fixed::ZERO;
        for _ in 0..leakers {
            if rng.chance(hit_chance) {
                hits += 1;
                damage += rng.roll(fx(stats.warhead), pct(15));
            }
        }
        let damage_ratio = ratio(damage, fx(hardness));

        let mut targets = Vec::new();
        match (order.target, target_unit) {
            (Target::Unit(id), Some(target)) => {
                targets.push(id);
                let fraction = (damage_ratio * pct(20)).min(pct(80));
                let amount = crate::combat::casualties(target, fraction);
                if amount > 0 {
                    deltas.push(StateDelta::Casualties {
                        unit: id,
                        amount,
                        cause: LossCause::Combat,
                    });
                }
                if hits > 0 {
                    deltas.push(StateDelta::MarkInCombat { unit: id });
                }
            }
            (Target::SupplyNode(node), _) => {
                let amount = to_count(damage_ratio * fx(25));
                if amount > 0 {
                    deltas.push(StateDelta::SupplyNodeDamage { node, amount });
                }
            }
            _ => {}
        }

        deltas.push(StateDelta::ExpendMissiles {
            unit: battery.id,
            amount: fired,
        });
        // The end-of-turn tick consumes one count of the reload.
        deltas.push(StateDelta::SetReload {
            unit: battery.id,
            turns: stats.reload_turns.saturating_add(1),
        });
        deltas.push(StateDelta::MarkFired { unit: battery.id });

        let outcome = if damage_ratio >= pct(150) {
            CombatOutcome::DecisiveVictory
        } else if damage_ratio >= Fixed::ONE {
            CombatOutcome::Victory
        } else if damage_ratio >= pct(50) {
            CombatOutcome::Marginal
        } else if hits > 0 {
            CombatOutcome::Stalemate
        } else {
            CombatOutcome::Defeat
        };

        Ok(Resolution::new(
            engagement,
            ctx.phase,
            targets,
            outcome,
            EngagementDetail::Missile {
                fired,
                engaged,
                intercepted,
                hits,
                damage_percent: as_percent(damage_ratio),
            },
            deltas,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::testing::{engagement, Arena};
    use crate::factions::FactionId;
    use crate::orders::{MissileMission, Order};
    use crate::turn::Phase;

    fn strike(target: Target, quantity: u32) -> Engagement {
        let order = Order::new(1, MissileMission::Strike, target).with_quantity(quantity);
        engagement(FactionId::Blue, EngagementKind::Missile(order))
    }

    fn detail(resolution: &Resolution) -> (u32, u32, u32) {
        match resolution.record.detail {
            EngagementDetail::Missile {
                fired,
                engaged,
                intercepted,
                ..
            } => (fired, engaged, intercepted),
            _ => panic!("not a missile record"),
        }
    }

    #[test]
    fn test_each_inbound_engaged_once() {
        let mut arena = Arena::new();
        arena.spawn(FactionId::Blue, "srbm_brigade", 2, 2);
        let target = arena.spawn(FactionId::Red, "infantry_brigade", 10, 2);
        arena.spawn(FactionId::Red, "bmd_battery", 11, 2);
        let resolution = MissileResolver
            .resolve(&strike(Target::Unit(target), 2), &arena.ctx(Phase::Missile), &mut TurnRng::from_seed(3))
            .unwrap();
        let (fired, engaged, intercepted) = detail(&resolution);
        assert_eq!(fired, 2);
        assert_eq!(engaged, 2);
        assert!(intercepted <= 2);
        assert!(resolution
            .deltas
            .contains(&StateDelta::UseChannels { unit: 3, amount: 2 }));
    }

    #[test]
    fn test_saturation_leaks_past_capacity() {
        let mut arena = Arena::new();
        arena.spawn(FactionId::Blue, "srbm_brigade", 2, 2);
        let target = arena.spawn(FactionId::Red, "infantry_brigade", 10, 2);
        let bmd = arena.spawn(FactionId::Red, "bmd_battery", 11, 2);
        arena.world.unit_mut(bmd).unwrap().channels_used = 3;
        let resolution = MissileResolver
            .resolve(&strike(Target::Unit(target), 4), &arena.ctx(Phase::Missile), &mut TurnRng::from_seed(8))
            .unwrap();
        let (fired, engaged, _) = detail(&resolution);
        assert_eq!(fired, 4);
        assert_eq!(engaged, 1);
    }

    #[test]
    fn test_unopposed_strike_expends_and_reloads() {
        let mut arena = Arena::new();
        arena.spawn(FactionId::Blue, "srbm_brigade", 2, 2);
        let target = arena.spawn(FactionId::Red, "infantry_brigade", 10, 2);
        let resolution = MissileResolver
            .resolve(&strike(Target::Unit(target), 0), &arena.ctx(Phase::Missile), &mut TurnRng::from_seed(1))
            .unwrap();
        let (fired, engaged, _) = detail(&resolution);
        assert_eq!((fired, engaged), (4, 0));
        assert!(resolution
            .deltas
            .contains(&StateDelta::ExpendMissiles { unit: 1, amount: 4 }));
        assert!(resolution.deltas.contains(&StateDelta::SetReload { unit: 1, turns: 2 }));
    }

    #[test]
    fn test_destroyed_target_is_contract_violation() {
        let mut arena = Arena::new();
        arena.spawn(FactionId::Blue, "srbm_brigade", 2, 2);
        let target = arena.spawn(FactionId::Red, "infantry_brigade", 10, 2);
        arena.world.unit_mut(target).unwrap().status = crate::unit::UnitStatus::Destroyed;
        let err = MissileResolver
            .resolve(&strike(Target::Unit(target), 2), &arena.ctx(Phase::Missile), &mut TurnRng::from_seed(1))
            .unwrap_err();
        assert!(err.is_contract_violation());
    }

    #[test]
    fn test_wrong_domain_is_contract_violation() {
        let mut arena = Arena::new();
        arena.spawn(FactionId::Blue, "infantry_brigade", 2, 2);
        let target = arena.spawn(FactionId::Red, "infantry_brigade", 3, 2);
        let err = MissileResolver
            .resolve(&strike(Target::Unit(target), 2), &arena.ctx(Phase::Missile), &mut TurnRng::from_seed(1))
            .unwrap_err();
        assert!(err.is_contract_violation());
    }
}
