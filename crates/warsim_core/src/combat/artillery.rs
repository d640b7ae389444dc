//! Tube and rocket artillery fire, including counter-battery.

use crate::catalog::Catalog;
use crate::combat::{
    casualties, loss_outcome, CombatOutcome, Engagement, EngagementDetail, EngagementKind,
    Footprint, Resolution, ResolveContext, Resolver, StateDelta,
};
use crate::error::Result;
use crate::factions::FactionId;
use crate::math::{fx, pct, ratio, to_count, Fixed};
use crate::orders::{ArtilleryMission, Order, Target};
use crate::rng::TurnRng;
use crate::unit::{Domain, LossCause, Unit, UnitId};
use crate::world::WorldState;

/// Highest fraction of a unit one fire mission can destroy.
const MAX_CASUALTY_PERCENT: i64 = 25;

/// Artillery phase resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtilleryResolver;

fn is_battery(unit: &Unit) -> bool {
    matches!(unit.domain, Domain::Artillery | Domain::Missile)
}

/// Units a mission could land on, in id order.
fn candidates<'a>(world: &'a WorldState, faction: FactionId, order: &Order<ArtilleryMission>) -> Vec<&'a Unit> {
    let enemy = faction.opponent();
    match (order.mission, order.target) {
        (_, Target::Unit(id)) => world.unit(id).into_iter().collect(),
        (ArtilleryMission::FireMission, target) => target
            .location(world)
            .map(|at| world.operational_within(enemy, at, target.radius()).collect())
            .unwrap_or_default(),
        (ArtilleryMission::CounterBattery, target) => target
            .location(world)
            .map(|at| {
                world
                    .operational_within(enemy, at, target.radius().max(1))
                    .filter(|u| is_battery(u))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

impl Resolver for ArtilleryResolver {
    fn footprint(&self, engagement: &Engagement, world: &WorldState, _catalog: &Catalog) -> Footprint {
        let mut footprint = Footprint::of(engagement.participants());
        if let EngagementKind::Artillery(order) = &engagement.kind {
            footprint.extend(candidates(world, engagement.faction, order).iter().map(|u| u.id));
        }
        footprint
    }

    fn resolve(&self, engagement: &Engagement, ctx: &ResolveContext<'_>, rng: &mut TurnRng) -> Result<Resolution> {
        let EngagementKind::Artillery(order) = &engagement.kind else {
            return Err(ctx.wrong_kind(engagement));
        };
        let (unit, spec) = ctx.issuer(engagement, Domain::Artillery)?;
        let stats = spec.artillery.as_ref().ok_or_else(|| ctx.wrong_kind(engagement))?;
        if let Some(id) = order.target.unit() {
            ctx.target(id)?;
        }

        let mut targets: Vec<&Unit> = candidates(ctx.world, engagement.faction, order);
        let mut detected = false;
        if order.mission == ArtilleryMission::CounterBattery {
            // Only a battery that has given itself away by firing can be located.
            let Some(battery) = targets.into_iter().find(|u| is_battery(u) && u.fired_this_turn) else {
                return Ok(Resolution::new(
                    engagement,
                    ctx.phase,
                    Vec::new(),
                    CombatOutcome::Defeat,
                    EngagementDetail::Artillery {
                        mission: order.mission,
                        detected,
                        hits: 0,
                        casualties: 0,
                    },
                    Vec::new(),
                ));
            };
            let battery_spec = ctx.platform(battery)?;
            let mobile = battery_spec
                .artillery
                .as_ref()
                .map_or(battery_spec.movement > 0, |a| a.mobile);
            let mut chance = pct(30);
            if stats.radar {
                chance += pct(30);
            }
            chance *= Fixed::ONE - ctx.effects.comms_disruption(engagement.faction);
            if mobile {
                chance *= pct(60);
            }
            detected = rng.chance(chance);
            targets = if detected { vec![battery] } else { Vec::new() };
        }

        let mut deltas = Vec::new();
        if targets.is_empty() {
            return Ok(Resolution::new(
                engagement,
                ctx.phase,
                Vec::new(),
                CombatOutcome::Defeat,
                EngagementDetail::Artillery {
                    mission: order.mission,
                    detected,
                    hits: 0,
                    casualties: 0,
                },
                deltas,
            ));
        }

        let rounds = to_count(fx(stats.rounds) * unit.strength_fraction()).min(unit.ammo);
        let per_target = ratio(fx(rounds), fx(targets.len() as u32));
        let mut salvo = pct(i64::from(stats.accuracy)) * ctx.env.visibility();
        if stats.mlrs {
            salvo *= pct(30);
        }

        let mut total_hits = Fixed::ZERO;
        let mut total_losses = 0;
        let mut total_strength = 0;
        for target in &targets {
            let target_spec = ctx.platform(target)?;
            let concealment = pct(i64::from(ctx.concealment(target)));
            let hits = per_target * salvo * (Fixed::ONE - concealment / 2);
            let damage = hits * fx(stats.damage);
            let vulnerability = target_spec.target_class.vulnerability(target.dug_in);
            let rate = rng
                .roll(damage / 1000 * vulnerability, pct(20))
                .min(pct(MAX_CASUALTY_PERCENT));
            let amount = casualties(target, rate);
            total_hits += hits;
            total_losses += amount;
            total_strength += target.strength;
            if amount > 0 {
                deltas.push(StateDelta::Casualties {
                    unit: target.id,
                    amount,
                    cause: LossCause::Combat,
                });
            }
            let suppression = to_count(damage / 2).min(80);
            if suppression > 0 {
                deltas.push(StateDelta::Suppress {
                    unit: target.id,
                    amount: suppression,
                });
            }
            deltas.push(StateDelta::MarkInCombat { unit: target.id });
        }
        if rounds > 0 {
            deltas.push(StateDelta::ExpendAmmo {
                unit: unit.id,
                amount: rounds,
            });
        }
        deltas.push(StateDelta::MarkFired { unit: unit.id });

        let ids: Vec<UnitId> = targets.iter().map(|u| u.id).collect();
        Ok(Resolution::new(
            engagement,
            ctx.phase,
            ids,
            loss_outcome(ratio(fx(total_losses), fx(total_strength))),
            EngagementDetail::Artillery {
                mission: order.mission,
                detected,
                hits: to_count(total_hits),
                casualties: total_losses,
            },
            deltas,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::testing::{engagement, losses, Arena};
    use crate::hex::HexCoord;
    use crate::turn::Phase;

    fn fire(unit: UnitId, mission: ArtilleryMission, target: Target) -> Engagement {
        engagement(FactionId::Blue, EngagementKind::Artillery(Order::new(unit, mission, target)))
    }

    #[test]
    fn test_dug_in_reduces_losses() {
        let mut arena = Arena::new();
        let guns = arena.spawn(FactionId::Blue, "sp_artillery_regiment", 4, 4);
        let open = arena.spawn(FactionId::Red, "infantry_brigade", 7, 4);
        let dug = arena.spawn(FactionId::Red, "infantry_brigade", 7, 6);
        arena.world.unit_mut(dug).unwrap().dug_in = 3;
        let ctx = arena.ctx(Phase::Artillery);
        let a = ArtilleryResolver
            .resolve(&fire(guns, ArtilleryMission::FireMission, Target::Unit(open)), &ctx, &mut TurnRng::from_seed(4))
            .unwrap();
        let b = ArtilleryResolver
            .resolve(&fire(guns, ArtilleryMission::FireMission, Target::Unit(dug)), &ctx, &mut TurnRng::from_seed(4))
            .unwrap();
        assert!(losses(&a, open) > losses(&b, dug));
        assert!(a.deltas.contains(&StateDelta::MarkFired { unit: guns }));
    }

    #[test]
    fn test_area_fire_hits_every_unit_in_radius() {
        let mut arena = Arena::new();
        let guns = arena.spawn(FactionId::Blue, "mlrs_battalion", 4, 4);
        let a = arena.spawn(FactionId::Red, "infantry_brigade", 8, 4);
        let b = arena.spawn(FactionId::Red, "infantry_brigade", 9, 4);
        arena.spawn(FactionId::Red, "infantry_brigade", 12, 4);
        let resolution = ArtilleryResolver
            .resolve(
                &fire(guns, ArtilleryMission::FireMission, Target::Area { center: HexCoord::new(8, 4), radius: 1 }),
                &arena.ctx(Phase::Artillery),
                &mut TurnRng::from_seed(1),
            )
            .unwrap();
        assert_eq!(resolution.record.targets, vec![a, b]);
    }

    #[test]
    fn test_counter_battery_needs_a_battery_that_fired() {
        let mut arena = Arena::new();
        let guns = arena.spawn(FactionId::Blue, "sp_artillery_regiment", 4, 4);
        let enemy = arena.spawn(FactionId::Red, "sp_artillery_regiment", 7, 4);
        let order = fire(guns, ArtilleryMission::CounterBattery, Target::Unit(enemy));
        let quiet = ArtilleryResolver
            .resolve(&order, &arena.ctx(Phase::Artillery), &mut TurnRng::from_seed(1))
            .unwrap();
        assert_eq!(quiet.outcome, CombatOutcome::Defeat);
        assert!(quiet.deltas.is_empty());

        arena.world.unit_mut(enemy).unwrap().fired_this_turn = true;
        let found = (0..30)
            .map(|seed| {
                ArtilleryResolver
                    .resolve(&order, &arena.ctx(Phase::Artillery), &mut TurnRng::from_seed(seed))
                    .unwrap()
            })
            .filter(|r| matches!(r.record.detail, EngagementDetail::Artillery { detected: true, .. }))
            .count();
        // Radar but a mobile target: 0.36 per attempt.
        assert!(found > 3 && found < 25);
    }
}
