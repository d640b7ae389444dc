//! Jamming, cyber attack and signals intelligence.
//!
//! Every EW action writes into the active-effects table or the fog of war,
//! so EW engagements are always resolved one at a time.

use crate::catalog::{Catalog, EwStats, SensorKind};
use crate::combat::{
    CombatOutcome, Engagement, EngagementDetail, EngagementKind, Footprint, Resolution,
    ResolveContext, Resolver, StateDelta,
};
use crate::effects::EffectKind;
use crate::error::Result;
use crate::factions::FactionId;
use crate::math::{as_percent, fx, pct, unit_clamp, Fixed};
use crate::orders::{CyberTarget, EwMission};
use crate::rng::TurnRng;
use crate::unit::{Domain, UnitId};
use crate::world::WorldState;

/// Most enemy units one SIGINT sweep can fix.
const SIGINT_MAX_INTERCEPTS: usize = 3;

/// Electronic warfare phase resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct EwResolver;

/// Best operational EW ratings fielded by `faction`.
fn best_ew(world: &WorldState, catalog: &Catalog, faction: FactionId) -> EwStats {
    world
        .units_of(faction)
        .filter(|u| u.domain == Domain::ElectronicWarfare && u.is_operational())
        .filter_map(|u| catalog.platform(&u.platform).and_then(|s| s.ew.clone()))
        .fold(EwStats::default(), |best, s| EwStats {
            power: best.power.max(s.power),
            eccm: best.eccm.max(s.eccm),
            cyber: best.cyber.max(s.cyber),
            cyber_defense: best.cyber_defense.max(s.cyber_defense),
            sigint: best.sigint.max(s.sigint),
            comsec: best.comsec.max(s.comsec),
        })
}

fn outcome(degradation: Fixed) -> CombatOutcome {
    if degradation >= pct(60) {
        CombatOutcome::DecisiveVictory
    } else if degradation >= pct(40) {
        CombatOutcome::Victory
    } else if degradation >= pct(20) {
        CombatOutcome::Marginal
    } else if degradation > Fixed::ZERO {
        CombatOutcome::Stalemate
    } else {
        CombatOutcome::Defeat
    }
}

impl Resolver for EwResolver {
    fn footprint(&self, engagement: &Engagement, world: &WorldState, _catalog: &Catalog) -> Footprint {
        let enemy_ew = world
            .units_of(engagement.faction.opponent())
            .filter(|u| u.domain == Domain::ElectronicWarfare)
            .map(|u| u.id);
        let mut footprint = Footprint::of(engagement.participants());
        footprint.extend(enemy_ew);
        footprint.exclusive()
    }

    fn resolve(&self, engagement: &Engagement, ctx: &ResolveContext<'_>, rng: &mut TurnRng) -> Result<Resolution> {
        let EngagementKind::Ew(order) = &engagement.kind else {
            return Err(ctx.wrong_kind(engagement));
        };
        let (unit, spec) = ctx.issuer(engagement, Domain::ElectronicWarfare)?;
        let stats = spec.ew.as_ref().ok_or_else(|| ctx.wrong_kind(engagement))?;
        let enemy = engagement.faction.opponent();
        let counter = best_ew(ctx.world, ctx.catalog, enemy);

        let power = pct(i64::from(stats.power))
            * unit.readiness
            * (Fixed::ONE - pct(i64::from(counter.eccm)) / 2);

        let mut deltas = Vec::new();
        let mut targets = Vec::new();
        let mut intercepts = 0;
        let (success, degradation) = match order.mission {
            EwMission::JamRadar => {
                let level = rng.roll(power, pct(10)).min(pct(80));
                deltas.push(effect(enemy, EffectKind::RadarJam, level));
                (true, level)
            }
            EwMission::JamComms => {
                let level = rng.roll(power, pct(10)).min(pct(70)) * pct(80);
                deltas.push(effect(enemy, EffectKind::CommsJam, level));
                (true, level)
            }
            EwMission::GpsDenial => {
                let level = rng.roll(power, pct(10)).min(pct(90)) * pct(90);
                deltas.push(effect(enemy, EffectKind::GpsJam, level));
                (true, level)
            }
            EwMission::Cyber(target) => {
                let chance = pct(i64::from(stats.cyber))
                    * (Fixed::ONE - pct(i64::from(counter.cyber_defense)) / 2);
                if rng.chance(chance) {
                    let (low, high) = target.damage_range();
                    let damage = pct(i64::from(rng.range_u32(low, high)));
                    deltas.push(effect(enemy, EffectKind::Cyber(target), damage));
                    match target {
                        CyberTarget::C2 => deltas.push(effect(enemy, EffectKind::CommsJam, damage / 2)),
                        CyberTarget::AirDefense => {
                            deltas.push(effect(enemy, EffectKind::RadarJam, damage * 100 / 150));
                        }
                        CyberTarget::Logistics | CyberTarget::Comms => {}
                    }
                    (true, damage)
                } else {
                    (false, Fixed::ZERO)
                }
            }
            EwMission::Sigint => {
                let center = order.target.location(ctx.world).unwrap_or(unit.position);
                let radius = order.target.radius().max(2);
                let mut emitters: Vec<(u32, UnitId)> = ctx
                    .world
                    .operational_within(enemy, center, radius)
                    .map(|u| (u.position.distance(center), u.id))
                    .collect();
                emitters.sort_unstable();
                let activity = (pct(40) + pct(15) * fx(emitters.len() as u32)).min(Fixed::ONE);
                let intercept = unit_clamp(
                    pct(i64::from(stats.sigint))
                        * activity
                        * (Fixed::ONE - pct(i64::from(counter.comsec)) / 2),
                );
                for (_, id) in emitters.into_iter().take(SIGINT_MAX_INTERCEPTS) {
                    if rng.chance(intercept) {
                        intercepts += 1;
                        targets.push(id);
                        deltas.push(StateDelta::IntelBoost {
                            faction: engagement.faction,
                            unit: id,
                            confidence: intercept,
                            sensor: SensorKind::Sigint,
                        });
                    }
                }
                (intercepts > 0, if intercepts > 0 { intercept } else { Fixed::ZERO })
            }
        };

        Ok(Resolution::new(
            engagement,
            ctx.phase,
            targets,
            outcome(degradation),
            EngagementDetail::Ew {
                mission: order.mission,
                success,
                degradation_percent: as_percent(degradation),
                intercepts,
            },
            deltas,
        ))
    }
}

const fn effect(target: FactionId, kind: EffectKind, level: Fixed) -> StateDelta {
    StateDelta::Effect { target, kind, level }
}
