//! Attack helicopters, heliborne assault and armed scouting.

use crate::catalog::{Catalog, HelicopterStats, SensorKind};
use crate::combat::{
    casualties, covering_air_defense, interceptor_capacity, interceptor_use, loss_outcome,
    CombatOutcome, Engagement, EngagementDetail, EngagementKind, Footprint, Resolution,
    ResolveContext, Resolver, StateDelta,
};
use crate::effects::EffectKind;
use crate::error::{EngineError, Result};
use crate::factions::FactionId;
use crate::hex::HexCoord;
use crate::math::{as_percent, fx, pct, ratio, to_count, unit_clamp, Fixed};
use crate::orders::{HelicopterMission, Order};
use crate::rng::TurnRng;
use crate::unit::{Domain, LossCause, Posture, Unit, UnitId};
use crate::world::WorldState;

/// Chance that a hit on a helicopter brings it down.
const KILL_GIVEN_HIT_PERCENT: i64 = 70;

/// Helicopter phase resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct HelicopterResolver;

/// Landing zone threat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LandingZone {
    Cold,
    Warm,
    Hot,
}

impl LandingZone {
    fn assess(world: &WorldState, enemy: FactionId, lz: HexCoord) -> Self {
        if world.operational_within(enemy, lz, 1).next().is_some() {
            Self::Hot
        } else if world.operational_within(enemy, lz, 2).next().is_some() {
            Self::Warm
        } else {
            Self::Cold
        }
    }

    fn risk(self) -> Fixed {
        match self {
            Self::Cold => Fixed::ZERO,
            Self::Warm => pct(30),
            Self::Hot => pct(70),
        }
    }

    const fn outcome(self) -> CombatOutcome {
        match self {
            Self::Cold => CombatOutcome::Victory,
            Self::Warm => CombatOutcome::Marginal,
            Self::Hot => CombatOutcome::Stalemate,
        }
    }
}

/// Fly `helicopters` airframes into air-defense coverage over `at`.
///
/// Returns the number shot down.
fn run_gauntlet(
    ctx: &ResolveContext<'_>,
    rng: &mut TurnRng,
    defender: FactionId,
    at: HexCoord,
    helicopters: u32,
    stats: &HelicopterStats,
    deltas: &mut Vec<StateDelta>,
) -> Result<u32> {
    let jam = ctx.effects.level(defender, EffectKind::RadarJam);
    let evasion = Fixed::ONE - pct(i64::from(stats.defensive_suite)) / 2;
    let mut alive = helicopters;
    for (ad_unit, _) in covering_air_defense(ctx.world, ctx.catalog, defender, at) {
        let ad_spec = ctx.platform(ad_unit)?;
        let Some(ad) = &ad_spec.air_defense else { continue };
        let shots = interceptor_capacity(ad_unit, ad_spec).min(2).min(alive);
        let hit = unit_clamp(
            pct(i64::from(ad.interceptor_pk))
                * ad.class.versus_helicopter()
                * evasion
                * (Fixed::ONE - jam / 2),
        );
        let mut kills = 0;
        for _ in 0..shots {
            if rng.chance(hit) && rng.chance(pct(KILL_GIVEN_HIT_PERCENT)) {
                kills += 1;
            }
        }
        alive -= kills.min(alive);
        interceptor_use(ad_unit.id, shots, deltas);
    }
    Ok(helicopters - alive)
}

fn helicopter_losses(unit: UnitId, lost: u32, deltas: &mut Vec<StateDelta>) {
    if lost > 0 {
        deltas.push(StateDelta::Casualties {
            unit,
            amount: lost,
            cause: LossCause::Combat,
        });
    }
}

impl Resolver for HelicopterResolver {
    fn footprint(&self, engagement: &Engagement, world: &WorldState, catalog: &Catalog) -> Footprint {
        let mut footprint = Footprint::of(engagement.participants());
        let EngagementKind::Helicopter(order) = &engagement.kind else {
            return footprint;
        };
        let enemy = engagement.faction.opponent();
        if let Some(at) = order.target.location(world) {
            let defenders = covering_air_defense(world, catalog, enemy, at);
            footprint.extend(defenders.iter().map(|(u, _)| u.id));
            if matches!(order.mission, HelicopterMission::AirAssault { .. }) {
                footprint.extend(world.operational_within(enemy, at, 2).map(|u| u.id));
            }
        }
        if order.mission == HelicopterMission::Scout {
            footprint = footprint.exclusive();
        }
        footprint
    }

    fn resolve(&self, engagement: &Engagement, ctx: &ResolveContext<'_>, rng: &mut TurnRng) -> Result<Resolution> {
        let EngagementKind::Helicopter(order) = &engagement.kind else {
            return Err(ctx.wrong_kind(engagement));
        };
        let (unit, spec) = ctx.issuer(engagement, Domain::Helicopter)?;
        let stats = spec.helicopter.as_ref().ok_or_else(|| ctx.wrong_kind(engagement))?;
        match order.mission {
            HelicopterMission::Attack => attack(engagement, ctx, rng, order, unit, stats),
            HelicopterMission::AirAssault { carried } => {
                air_assault(engagement, ctx, rng, order, unit, stats, carried)
            }
            HelicopterMission::Scout => scout(engagement, ctx, rng, order, unit, stats),
        }
    }
}

fn attack(
    engagement: &Engagement,
    ctx: &ResolveContext<'_>,
    rng: &mut TurnRng,
    order: &Order<HelicopterMission>,
    unit: &Unit,
    stats: &HelicopterStats,
) -> Result<Resolution> {
    let target_id = order.target.unit().ok_or_else(|| ctx.wrong_kind(engagement))?;
    let target = ctx.target(target_id)?;
    let target_spec = ctx.platform(target)?;
    let mut deltas = Vec::new();

    let lost = run_gauntlet(ctx, rng, target.faction, target.position, unit.strength, stats, &mut deltas)?;
    let survivors = unit.strength - lost;
    let concealment = pct(i64::from(ctx.concealment(target)));
    let hits = fx(survivors)
        * pct(i64::from(stats.attack))
        * (Fixed::ONE - concealment)
        * ctx.env.air_ops();
    let fraction = rng
        .roll(hits * pct(2) * target_spec.target_class.vulnerability(target.dug_in), pct(20))
        .min(pct(50));
    let amount = casualties(target, fraction);

    helicopter_losses(unit.id, lost, &mut deltas);
    if amount > 0 {
        deltas.push(StateDelta::Casualties {
            unit: target.id,
            amount,
            cause: LossCause::Combat,
        });
    }
    let rockets = (survivors * 2).min(unit.ammo);
    if rockets > 0 {
        deltas.push(StateDelta::ExpendAmmo {
            unit: unit.id,
            amount: rockets,
        });
    }
    deltas.push(StateDelta::MarkInCombat { unit: unit.id });
    deltas.push(StateDelta::MarkInCombat { unit: target.id });

    Ok(Resolution::new(
        engagement,
        ctx.phase,
        vec![target.id],
        loss_outcome(ratio(fx(amount), fx(target.strength))),
        EngagementDetail::Helicopter {
            helicopters_lost: lost,
            hits: to_count(hits),
            casualties: amount,
        },
        deltas,
    ))
}

fn air_assault(
    engagement: &Engagement,
    ctx: &ResolveContext<'_>,
    rng: &mut TurnRng,
    order: &Order<HelicopterMission>,
    unit: &Unit,
    stats: &HelicopterStats,
    carried: UnitId,
) -> Result<Resolution> {
    let troops = ctx.world.unit(carried).filter(|u| u.is_alive()).ok_or_else(|| {
        EngineError::contract(ctx.phase, format!("carried unit {carried} is gone"))
    })?;
    let lz = order.target.location(ctx.world).ok_or_else(|| ctx.wrong_kind(engagement))?;
    let enemy = engagement.faction.opponent();
    let zone = LandingZone::assess(ctx.world, enemy, lz);
    let mut deltas = Vec::new();

    let detail = |lost, losses, landed| EngagementDetail::AirAssault {
        carried,
        landing_zone: lz,
        risk_percent: as_percent(zone.risk()),
        helicopters_lost: lost,
        losses,
        landed,
    };

    // An occupied landing zone cannot be used.
    if ctx.world.occupied_by(lz, enemy) {
        return Ok(Resolution::new(
            engagement,
            ctx.phase,
            vec![carried],
            CombatOutcome::Defeat,
            detail(0, 0, false),
            deltas,
        ));
    }

    let lost = run_gauntlet(ctx, rng, enemy, lz, unit.strength, stats, &mut deltas)?;
    helicopter_losses(unit.id, lost, &mut deltas);
    if lost == unit.strength {
        return Ok(Resolution::new(
            engagement,
            ctx.phase,
            vec![carried],
            CombatOutcome::DecisiveDefeat,
            detail(lost, 0, false),
            deltas,
        ));
    }

    // Troops aboard downed airframes share their fate.
    let downed = ratio(fx(lost), fx(unit.strength));
    let exposure = zone.risk() * pct(20) + downed / 2;
    let losses = casualties(troops, rng.roll(exposure, pct(20)).min(Fixed::ONE));
    if losses > 0 {
        deltas.push(StateDelta::Casualties {
            unit: carried,
            amount: losses,
            cause: LossCause::Combat,
        });
    }
    deltas.push(StateDelta::Move { unit: carried, to: lz });
    deltas.push(StateDelta::Control {
        cell: lz,
        faction: engagement.faction,
    });
    deltas.push(StateDelta::DugIn { unit: carried, level: 0 });
    deltas.push(StateDelta::Posture {
        unit: carried,
        posture: Posture::Defend,
    });
    if zone != LandingZone::Cold {
        deltas.push(StateDelta::MarkInCombat { unit: carried });
    }

    Ok(Resolution::new(
        engagement,
        ctx.phase,
        vec![carried],
        zone.outcome(),
        detail(lost, losses, true),
        deltas,
    ))
}

fn scout(
    engagement: &Engagement,
    ctx: &ResolveContext<'_>,
    rng: &mut TurnRng,
    order: &Order<HelicopterMission>,
    unit: &Unit,
    stats: &HelicopterStats,
) -> Result<Resolution> {
    let center = order.target.location(ctx.world).ok_or_else(|| ctx.wrong_kind(engagement))?;
    let enemy = engagement.faction.opponent();
    let mut deltas = Vec::new();

    let lost = run_gauntlet(ctx, rng, enemy, center, unit.strength, stats, &mut deltas)?;
    helicopter_losses(unit.id, lost, &mut deltas);

    let eyes = pct(i64::from(stats.scout)) * ratio(fx(unit.strength - lost), fx(unit.strength));
    let mut targets = Vec::new();
    for contact in ctx.world.operational_within(enemy, center, order.target.radius().max(2)) {
        let concealment = pct(i64::from(ctx.concealment(contact)));
        let p = eyes * (Fixed::ONE - concealment / 2) * ctx.env.visibility();
        if rng.chance(p) {
            targets.push(contact.id);
            deltas.push(StateDelta::IntelBoost {
                faction: engagement.faction,
                unit: contact.id,
                confidence: unit_clamp(p + pct(30)),
                sensor: SensorKind::Scout,
            });
        }
    }
    let contacts = targets.len() as u32;
    let outcome = if contacts > 0 {
        CombatOutcome::Stalemate
    } else {
        CombatOutcome::Defeat
    };
    Ok(Resolution::new(
        engagement,
        ctx.phase,
        targets,
        outcome,
        EngagementDetail::Reconnaissance {
            sensor: SensorKind::Scout,
            contacts,
        },
        deltas,
    ))
}
