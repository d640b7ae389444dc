//! Drone strikes, swarms and reconnaissance.
//!
//! Air-defense engagement channels are a per-turn budget shared by every
//! engagement that turn. Tracks beyond the remaining capacity are never
//! engaged.

use crate::catalog::{Catalog, DroneKind, SensorKind};
use crate::combat::{
    covering_air_defense, interceptor_capacity, interceptor_use, loss_outcome, CombatOutcome,
    Engagement, EngagementDetail, EngagementKind, Footprint, Resolution, ResolveContext, Resolver,
    StateDelta,
};
use crate::effects::EffectKind;
use crate::error::Result;
use crate::math::{fx, pct, ratio, to_count, unit_clamp, Fixed};
use crate::orders::DroneMission;
use crate::rng::TurnRng;
use crate::unit::{Domain, LossCause};
use crate::world::WorldState;

const DEFAULT_LOITERING_SALVO: u32 = 8;
const DEFAULT_SWARM_SIZE: u32 = 20;
const UCAV_WEAPONS_PER_AIRFRAME: u32 = 2;

/// Drone phase resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct DroneResolver;

impl Resolver for DroneResolver {
    fn footprint(&self, engagement: &Engagement, world: &WorldState, catalog: &Catalog) -> Footprint {
        let mut footprint = Footprint::of(engagement.participants());
        let EngagementKind::Drone(order) = &engagement.kind else {
            return footprint;
        };
        if order.mission == DroneMission::Isr {
            return footprint.exclusive();
        }
        if let Some(at) = order.target.location(world) {
            let defenders = covering_air_defense(world, catalog, engagement.faction.opponent(), at);
            footprint.extend(defenders.iter().map(|(u, _)| u.id));
        }
        footprint
    }

    fn resolve(&self, engagement: &Engagement, ctx: &ResolveContext<'_>, rng: &mut TurnRng) -> Result<Resolution> {
        let EngagementKind::Drone(order) = &engagement.kind else {
            return Err(ctx.wrong_kind(engagement));
        };
        let (unit, spec) = ctx.issuer(engagement, Domain::Drone)?;
        let stats = spec.drone.as_ref().ok_or_else(|| ctx.wrong_kind(engagement))?;
        let enemy = engagement.faction.opponent();

        if order.mission == DroneMission::Isr {
            let center = order.target.location(ctx.world).unwrap_or(unit.position);
            let radius = order.target.radius().max(1);
            let sensor = pct(i64::from(stats.sensor)) * unit.readiness * ctx.env.visibility();
            let mut deltas = Vec::new();
            let mut targets = Vec::new();
            for contact in ctx.world.operational_within(enemy, center, radius) {
                let concealment = u32::from(contact.dug_in) * 15 + 20;
                let p = sensor * (Fixed::ONE - pct(i64::from(concealment)));
                if rng.chance(p) {
                    targets.push(contact.id);
                    deltas.push(StateDelta::IntelBoost {
                        faction: engagement.faction,
                        unit: contact.id,
                        confidence: unit_clamp(pct(50) + p / 2),
                        sensor: SensorKind::DroneIsr,
                    });
                }
            }
            let outcome = if targets.is_empty() {
                CombatOutcome::Defeat
            } else {
                CombatOutcome::Stalemate
            };
            let contacts = targets.len() as u32;
            return Ok(Resolution::new(
                engagement,
                ctx.phase,
                targets,
                outcome,
                EngagementDetail::Reconnaissance {
                    sensor: SensorKind::DroneIsr,
                    contacts,
                },
                deltas,
            ));
        }

        let target_id = order.target.unit().ok_or_else(|| ctx.wrong_kind(engagement))?;
        let target = ctx.target(target_id)?;
        let target_spec = ctx.platform(target)?;
        let expendable = matches!(stats.kind, DroneKind::Loitering | DroneKind::Swarm);
        let launched = match stats.kind {
            DroneKind::Loitering => order.quantity_or(DEFAULT_LOITERING_SALVO).min(unit.missiles),
            DroneKind::Swarm => order.quantity_or(DEFAULT_SWARM_SIZE).min(unit.missiles),
            DroneKind::Ucav | DroneKind::Isr => order.quantity_or(unit.strength).min(unit.strength),
        };
        let escorts = if order.mission == DroneMission::Swarm { stats.escorts } else { 0 };
        let tracks = escorts + launched;

        // Engage tracks in arrival order: escorts lead and soak up intercepts.
        let jam = ctx.effects.level(enemy, EffectKind::RadarJam);
        let mut deltas = Vec::new();
        let mut engaged = 0;
        let mut intercepted = 0;
        let mut attackers_lost = 0;
        for (ad_unit, _) in covering_air_defense(ctx.world, ctx.catalog, enemy, target.position) {
            let ad_spec = ctx.platform(ad_unit)?;
            let Some(ad) = &ad_spec.air_defense else { continue };
            let shots = interceptor_capacity(ad_unit, ad_spec).min(tracks - engaged);
            let mut pk = pct(i64::from(ad.interceptor_pk))
                * (Fixed::ONE - pct(i64::from(spec.stealth)) / 2)
                * (Fixed::ONE - jam);
            if stats.kind == DroneKind::Loitering {
                pk *= pct(60);
            }
            for _ in 0..shots {
                let track = engaged;
                engaged += 1;
                if rng.chance(pk) {
                    intercepted += 1;
                    if track >= escorts {
                        attackers_lost += 1;
                    }
                }
            }
            interceptor_use(ad_unit.id, shots, &mut deltas);
            if engaged == tracks {
                break;
            }
        }

        let survivors = launched - attackers_lost;
        let (shots, terminal) = if stats.kind == DroneKind::Ucav {
            let weapons = (survivors * UCAV_WEAPONS_PER_AIRFRAME).min(unit.ammo);
            (weapons, pct(i64::from(stats.terminal_pk)) / 2)
        } else {
            (survivors, pct(i64::from(stats.terminal_pk)))
        };
        let hits = (0..shots).filter(|_| rng.chance(terminal)).count() as u32;

        let vulnerability = target_spec.target_class.vulnerability(target.dug_in);
        let per_hit = to_count(fx(target.max_strength) / 50 * vulnerability).max(1);
        let amount = (hits * per_hit).min(target.strength);
        if amount > 0 {
            deltas.push(StateDelta::Casualties {
                unit: target.id,
                amount,
                cause: LossCause::Combat,
            });
        }
        if hits > 0 {
            deltas.push(StateDelta::MarkInCombat { unit: target.id });
            if order.mission == DroneMission::Swarm {
                deltas.push(StateDelta::Suppress {
                    unit: target.id,
                    amount: (hits * 10).min(80),
                });
            }
        }

        if expendable {
            deltas.push(StateDelta::ExpendMissiles {
                unit: unit.id,
                amount: launched,
            });
        } else {
            if attackers_lost > 0 {
                deltas.push(StateDelta::Casualties {
                    unit: unit.id,
                    amount: attackers_lost,
                    cause: LossCause::Combat,
                });
            }
            if shots > 0 {
                deltas.push(StateDelta::ExpendAmmo {
                    unit: unit.id,
                    amount: shots,
                });
            }
        }

        let fraction = ratio(fx(amount), fx(target.strength));
        Ok(Resolution::new(
            engagement,
            ctx.phase,
            vec![target.id],
            loss_outcome(fraction),
            EngagementDetail::Drone {
                mission: order.mission,
                launched: tracks,
                engaged,
                intercepted,
                hits,
                casualties: amount,
            },
            deltas,
        ))
    }
}
