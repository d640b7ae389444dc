//! Manoeuvre combat, movement and entrenchment.
//!
//! Attacks are resolved with a modified Lanchester square law integrated
//! over a fixed number of one-hour sub-steps. Each sub-step draws exactly
//! two random factors, one per side, so two battles that differ only in
//! starting power consume the same random sequence.

use crate::catalog::{Catalog, PlatformSpec, TargetClass};
use crate::combat::{
    CombatOutcome, Engagement, EngagementDetail, EngagementKind, Footprint, Resolution,
    ResolveContext, Resolver, StateDelta,
};
use crate::effects::EffectKind;
use crate::error::Result;
use crate::factions::FactionId;
use crate::hex::{HexCoord, Terrain};
use crate::math::{as_percent, fx, pct, ratio, to_count, Fixed};
use crate::orders::{AttackPosture, CyberTarget, GroundMission, Order};
use crate::rng::TurnRng;
use crate::unit::{Domain, LossCause, Posture, Unit};
use crate::world::WorldState;

/// Attrition coefficient: strength lost per point of opposing power per hour.
const ATTRITION_PERCENT: i64 = 15;

/// Ratio reported when the defender brings no power at all.
const UNOPPOSED_RATIO: i64 = 10;

/// Ground phase resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct GroundResolver;

impl Resolver for GroundResolver {
    fn footprint(&self, engagement: &Engagement, world: &WorldState, catalog: &Catalog) -> Footprint {
        let mut footprint = Footprint::of(engagement.participants());
        let EngagementKind::Ground(order) = &engagement.kind else {
            return footprint;
        };
        let Some(unit) = world.unit(order.unit) else {
            return footprint;
        };
        let (center, radius) = match order.mission {
            GroundMission::Attack(_) => match order.target.location(world) {
                Some(at) => (at, 2),
                None => return footprint,
            },
            GroundMission::Move => {
                let movement = catalog.platform(&unit.platform).map_or(0, |s| s.movement);
                (unit.position, movement + 1)
            }
            GroundMission::Defend => return footprint,
        };
        footprint.extend(
            world
                .units()
                .filter(|u| u.is_alive() && u.position.distance(center) <= radius)
                .map(|u| u.id),
        );
        footprint
    }

    fn resolve(&self, engagement: &Engagement, ctx: &ResolveContext<'_>, rng: &mut TurnRng) -> Result<Resolution> {
        let EngagementKind::Ground(order) = &engagement.kind else {
            return Err(ctx.wrong_kind(engagement));
        };
        let (unit, spec) = ctx.issuer(engagement, Domain::Ground)?;
        match order.mission {
            GroundMission::Attack(posture) => attack(engagement, ctx, rng, order, posture, unit, spec),
            GroundMission::Move => Ok(advance(engagement, ctx, order, unit, spec)),
            GroundMission::Defend => Ok(entrench(engagement, ctx, unit)),
        }
    }
}

const fn is_close(terrain: Terrain) -> bool {
    matches!(terrain, Terrain::Forest | Terrain::Urban | Terrain::Mountain)
}

const fn posture_of(posture: AttackPosture) -> Posture {
    match posture {
        AttackPosture::Assault => Posture::Assault,
        AttackPosture::Probe => Posture::Probe,
        AttackPosture::Exploitation => Posture::Exploitation,
    }
}

/// Power common to both sides before role-specific modifiers.
fn base_power(ctx: &ResolveContext<'_>, unit: &Unit, spec: &PlatformSpec, against: TargetClass, close: bool) -> Fixed {
    let mut power = fx(unit.strength)
        * unit.readiness
        * pct(i64::from(spec.quality))
        * spec.target_class.matchup(against, close)
        * (Fixed::ONE - pct(i64::from(unit.suppression.min(100))));
    if unit.degraded {
        power *= pct(75);
    }
    power * (Fixed::ONE - ctx.effects.level(unit.faction, EffectKind::Cyber(CyberTarget::C2)) / 2)
}

fn artillery_adjacent(world: &WorldState, faction: FactionId, at: HexCoord) -> bool {
    world.any_operational(faction, Domain::Artillery, |u| u.position.distance(at) <= 1)
}

/// Effective attacker and defender power at the start of the battle.
fn battle_powers(
    ctx: &ResolveContext<'_>,
    posture: AttackPosture,
    attacker: &Unit,
    attacker_spec: &PlatformSpec,
    defender: &Unit,
    defender_spec: &PlatformSpec,
) -> (Fixed, Fixed) {
    let cell = ctx.world.map().cell(defender.position);
    let terrain = cell.map_or(Terrain::Plains, |c| c.terrain);
    let close = is_close(terrain);

    let mut attack = base_power(ctx, attacker, attacker_spec, defender_spec.target_class, close)
        * posture.multiplier()
        * (Fixed::ONE - ctx.effects.comms_disruption(attacker.faction) / 2);
    if artillery_adjacent(ctx.world, attacker.faction, attacker.position) {
        attack *= pct(115);
    }

    let mut defense = base_power(ctx, defender, defender_spec, attacker_spec.target_class, close)
        * pct(i64::from(ctx.catalog.terrain(terrain).defense))
        * (Fixed::ONE + pct(15) * fx(u32::from(defender.dug_in)));
    if cell.is_some_and(|c| c.river) {
        defense *= pct(150);
    }
    if artillery_adjacent(ctx.world, defender.faction, defender.position) {
        defense *= pct(110);
    }
    (attack, defense)
}

/// Strength each side loses over `steps` sub-steps, given each side's
/// starting power and strength.
///
/// Current power falls in proportion to remaining strength. Exactly two
/// draws are taken from `rng` per sub-step.
#[must_use]
pub fn lanchester(
    rng: &mut TurnRng,
    steps: u32,
    (attack, attacker_strength): (Fixed, u32),
    (defense, defender_strength): (Fixed, u32),
) -> (u32, u32) {
    let steps = steps.max(1);
    let k = pct(ATTRITION_PERCENT) / i64::from(steps);
    let (start_a, start_d) = (fx(attacker_strength), fx(defender_strength));
    let (mut left_a, mut left_d) = (start_a, start_d);
    for _ in 0..steps {
        let roll_a = rng.roll(Fixed::ONE, pct(20));
        let roll_d = rng.roll(Fixed::ONE, pct(20));
        let now_a = attack * ratio(left_a, start_a);
        let now_d = defense * ratio(left_d, start_d);
        left_a = (left_a - k * now_d * roll_a).max(Fixed::ZERO);
        left_d = (left_d - k * now_a * roll_d).max(Fixed::ZERO);
    }
    (
        to_count(start_a - left_a).min(attacker_strength),
        to_count(start_d - left_d).min(defender_strength),
    )
}

/// Adjacent cell farthest from `threat` that the enemy does not hold.
fn retreat_cell(world: &WorldState, unit: &Unit, threat: HexCoord) -> Option<HexCoord> {
    let enemy = unit.faction.opponent();
    let mut best: Option<(u32, HexCoord)> = None;
    for cell in unit.position.neighbors() {
        if !world.map().contains(cell) || world.occupied_by(cell, enemy) {
            continue;
        }
        let distance = cell.distance(threat);
        if best.map_or(true, |(d, _)| distance > d) {
            best = Some((distance, cell));
        }
    }
    best.map(|(_, cell)| cell)
}

fn shock(losses: u32, strength: u32) -> u32 {
    to_count(ratio(fx(losses), fx(strength)) * fx(50))
}

fn attack(
    engagement: &Engagement,
    ctx: &ResolveContext<'_>,
    rng: &mut TurnRng,
    order: &Order<GroundMission>,
    posture: AttackPosture,
    attacker: &Unit,
    attacker_spec: &PlatformSpec,
) -> Result<Resolution> {
    let target = order.target.unit().ok_or_else(|| ctx.wrong_kind(engagement))?;
    let defender = ctx.target(target)?;
    let defender_spec = ctx.platform(defender)?;

    let (attack, defense) = battle_powers(ctx, posture, attacker, attacker_spec, defender, defender_spec);
    let power_ratio = if defense == Fixed::ZERO {
        Fixed::from_num(UNOPPOSED_RATIO)
    } else {
        attack / defense
    };
    let (attacker_losses, mut defender_losses) = lanchester(
        rng,
        ctx.config.ground_substeps,
        (attack, attacker.strength),
        (defense, defender.strength),
    );
    let outcome = CombatOutcome::from_ratio(power_ratio);

    let gives_ground = match outcome {
        CombatOutcome::DecisiveVictory | CombatOutcome::Victory => true,
        CombatOutcome::Marginal => rng.chance(pct(50)),
        _ => false,
    };
    let mut retreated = false;
    let mut deltas = Vec::new();
    let wiped_out = defender_losses >= defender.strength;
    if gives_ground && !wiped_out {
        if let Some(cell) = retreat_cell(ctx.world, defender, attacker.position) {
            retreated = true;
            deltas.push(StateDelta::Move { unit: defender.id, to: cell });
            deltas.push(StateDelta::DugIn { unit: defender.id, level: 0 });
        } else {
            // Nowhere to go: the position is overrun.
            defender_losses += to_count(fx(defender.strength - defender_losses) * pct(10));
        }
    }
    let advanced = attacker_losses < attacker.strength
        && ((retreated && outcome == CombatOutcome::DecisiveVictory) || defender_losses >= defender.strength);
    if advanced {
        deltas.push(StateDelta::Move {
            unit: attacker.id,
            to: defender.position,
        });
        deltas.push(StateDelta::Control {
            cell: defender.position,
            faction: attacker.faction,
        });
    }

    for (unit, amount) in [(attacker.id, attacker_losses), (defender.id, defender_losses)] {
        if amount > 0 {
            deltas.push(StateDelta::Casualties {
                unit,
                amount,
                cause: LossCause::Combat,
            });
        }
    }
    let attacker_disorder = if power_ratio == Fixed::ZERO {
        50
    } else {
        to_count(fx(5) + fx(10) / power_ratio).min(50)
    };
    let defender_disorder = to_count(fx(5) + fx(10) * power_ratio).min(50);
    deltas.extend([
        StateDelta::Organization {
            unit: attacker.id,
            loss: attacker_disorder,
        },
        StateDelta::Organization {
            unit: defender.id,
            loss: defender_disorder,
        },
        StateDelta::Morale {
            unit: attacker.id,
            loss: shock(attacker_losses, attacker.strength),
        },
        StateDelta::Morale {
            unit: defender.id,
            loss: shock(defender_losses, defender.strength),
        },
        StateDelta::DugIn {
            unit: attacker.id,
            level: 0,
        },
        StateDelta::Posture {
            unit: attacker.id,
            posture: posture_of(posture),
        },
        StateDelta::MarkInCombat { unit: attacker.id },
        StateDelta::MarkInCombat { unit: defender.id },
    ]);

    Ok(Resolution::new(
        engagement,
        ctx.phase,
        vec![defender.id],
        outcome,
        EngagementDetail::Ground {
            attacker_losses,
            defender_losses,
            ratio_percent: as_percent(power_ratio),
            retreated,
            advanced,
        },
        deltas,
    ))
}

/// March along the hex line towards the ordered cell.
fn advance(
    engagement: &Engagement,
    ctx: &ResolveContext<'_>,
    order: &Order<GroundMission>,
    unit: &Unit,
    spec: &PlatformSpec,
) -> Resolution {
    let enemy = unit.faction.opponent();
    let destination = order.target.location(ctx.world).unwrap_or(unit.position);
    let map = ctx.world.map();
    let mut allowance = fx(spec.movement) * ctx.env.movement() * fx(100);
    let mut reached = unit.position;
    let mut hexes = 0;
    let mut deltas = Vec::new();

    for cell in unit.position.line_to(destination).into_iter().skip(1) {
        if !map.contains(cell) || ctx.world.occupied_by(cell, enemy) {
            break;
        }
        let cost = fx(ctx.catalog.terrain(map.terrain_at(cell)).movement_cost);
        // A unit that can move at all always makes its first hex.
        if allowance <= Fixed::ZERO || (hexes > 0 && cost > allowance) {
            break;
        }
        allowance = (allowance - cost).max(Fixed::ZERO);
        reached = cell;
        hexes += 1;
        deltas.push(StateDelta::Control {
            cell,
            faction: unit.faction,
        });
    }

    if hexes > 0 {
        deltas.insert(0, StateDelta::Move { unit: unit.id, to: reached });
        deltas.push(StateDelta::DugIn { unit: unit.id, level: 0 });
        deltas.push(StateDelta::Posture {
            unit: unit.id,
            posture: Posture::Moving,
        });
    }
    Resolution::new(
        engagement,
        ctx.phase,
        Vec::new(),
        CombatOutcome::Stalemate,
        EngagementDetail::Movement {
            from: unit.position,
            to: reached,
            hexes,
        },
        deltas,
    )
}

fn entrench(engagement: &Engagement, ctx: &ResolveContext<'_>, unit: &Unit) -> Resolution {
    let level = unit.dug_in.saturating_add(1).min(3);
    Resolution::new(
        engagement,
        ctx.phase,
        Vec::new(),
        CombatOutcome::Stalemate,
        EngagementDetail::Defend { dug_in: level },
        vec![
            StateDelta::DugIn { unit: unit.id, level },
            StateDelta::Posture {
                unit: unit.id,
                posture: Posture::Defend,
            },
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::testing::{engagement, losses, Arena};
    use crate::orders::Target;
    use crate::turn::Phase;
    use crate::unit::UnitId;

    fn order(unit: UnitId, mission: GroundMission, target: Target) -> Engagement {
        engagement(FactionId::Blue, EngagementKind::Ground(Order::new(unit, mission, target)))
    }

    fn assault(arena: &Arena, attacker: UnitId, defender: UnitId, seed: u64) -> Resolution {
        GroundResolver
            .resolve(
                &order(attacker, GroundMission::Attack(AttackPosture::Assault), Target::Unit(defender)),
                &arena.ctx(Phase::Ground),
                &mut TurnRng::from_seed(seed),
            )
            .unwrap()
    }

    #[test]
    fn test_armour_overruns_weakened_infantry() {
        let mut arena = Arena::new();
        let tanks = arena.spawn(FactionId::Blue, "armoured_brigade", 5, 5);
        let infantry = arena.spawn(FactionId::Red, "infantry_brigade", 6, 5);
        arena.world.unit_mut(infantry).unwrap().strength = 60;
        let resolution = assault(&arena, tanks, infantry, 1);
        assert_eq!(resolution.outcome, CombatOutcome::DecisiveVictory);
        match resolution.record.detail {
            EngagementDetail::Ground { retreated, advanced, .. } => {
                assert!(retreated);
                assert!(advanced);
            }
            _ => panic!("not a ground record"),
        }
        assert!(resolution.deltas.contains(&StateDelta::Move {
            unit: tanks,
            to: HexCoord::new(6, 5)
        }));
    }

    #[test]
    fn test_river_and_entrenchment_favour_defender() {
        let mut arena = Arena::new();
        let a = arena.spawn(FactionId::Blue, "infantry_brigade", 5, 5);
        let d = arena.spawn(FactionId::Red, "infantry_brigade", 6, 5);
        let open = assault(&arena, a, d, 3);
        arena.world.map_mut().cell_mut(HexCoord::new(6, 5)).unwrap().river = true;
        arena.world.unit_mut(d).unwrap().dug_in = 2;
        let fortified = assault(&arena, a, d, 3);
        assert!(fortified.outcome.rank() < open.outcome.rank());
        assert!(losses(&fortified, a) >= losses(&open, a));
    }

    #[test]
    fn test_lanchester_defender_losses_grow_with_attacker_power() {
        let mut weak = TurnRng::from_seed(11);
        let mut strong = TurnRng::from_seed(11);
        let (_, d_weak) = lanchester(&mut weak, 6, (fx(60), 100), (fx(80), 100));
        let (_, d_strong) = lanchester(&mut strong, 6, (fx(120), 100), (fx(80), 100));
        assert!(d_strong > d_weak);
    }

    #[test]
    fn test_lanchester_zero_power_inflicts_nothing() {
        let (a, d) = lanchester(&mut TurnRng::from_seed(2), 6, (Fixed::ZERO, 100), (fx(80), 100));
        assert_eq!(d, 0);
        assert!(a > 0);
    }

    #[test]
    fn test_move_stops_before_enemy() {
        let mut arena = Arena::new();
        let mech = arena.spawn(FactionId::Blue, "mech_brigade", 2, 5);
        arena.spawn(FactionId::Red, "infantry_brigade", 4, 5);
        let resolution = GroundResolver
            .resolve(
                &order(mech, GroundMission::Move, Target::Cell(HexCoord::new(8, 5))),
                &arena.ctx(Phase::Ground),
                &mut TurnRng::from_seed(1),
            )
            .unwrap();
        assert_eq!(
            resolution.record.detail,
            EngagementDetail::Movement {
                from: HexCoord::new(2, 5),
                to: HexCoord::new(3, 5),
                hexes: 1
            }
        );
    }

    #[test]
    fn test_move_limited_by_allowance() {
        let mut arena = Arena::new();
        let infantry = arena.spawn(FactionId::Blue, "infantry_brigade", 2, 5);
        let resolution = GroundResolver
            .resolve(
                &order(infantry, GroundMission::Move, Target::Cell(HexCoord::new(9, 5))),
                &arena.ctx(Phase::Ground),
                &mut TurnRng::from_seed(1),
            )
            .unwrap();
        assert!(matches!(resolution.record.detail, EngagementDetail::Movement { hexes: 2, .. }));
        assert!(resolution.deltas.contains(&StateDelta::Control {
            cell: HexCoord::new(4, 5),
            faction: FactionId::Blue
        }));
    }

    #[test]
    fn test_defend_caps_dug_in() {
        let mut arena = Arena::new();
        let infantry = arena.spawn(FactionId::Blue, "infantry_brigade", 2, 5);
        arena.world.unit_mut(infantry).unwrap().dug_in = 3;
        let resolution = GroundResolver
            .resolve(
                &order(infantry, GroundMission::Defend, Target::Cell(HexCoord::new(2, 5))),
                &arena.ctx(Phase::Ground),
                &mut TurnRng::from_seed(1),
            )
            .unwrap();
        assert_eq!(resolution.record.detail, EngagementDetail::Defend { dug_in: 3 });
    }
}
