//! Special forces missions: infiltration, execution and extraction.

use crate::catalog::{Catalog, SensorKind, SpecialForcesStats};
use crate::combat::{
    casualties, CombatOutcome, Engagement, EngagementDetail, EngagementKind, Footprint,
    Resolution, ResolveContext, Resolver, StateDelta,
};
use crate::error::Result;
use crate::math::{as_percent, fx, pct, to_count, unit_clamp, Fixed};
use crate::orders::{SfTask, Target};
use crate::rng::TurnRng;
use crate::unit::{Domain, LossCause, Unit, UnitId};
use crate::world::WorldState;

/// Special forces phase resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpecialForcesResolver;

/// Site security by entrenchment level.
fn security(dug_in: u8) -> Fixed {
    pct(match dug_in {
        0 => 30,
        1 => 50,
        2 => 70,
        _ => 90,
    })
}

fn outcome(objective: Fixed, compromised: bool) -> CombatOutcome {
    if objective >= pct(80) && !compromised {
        CombatOutcome::DecisiveVictory
    } else if objective >= pct(50) {
        CombatOutcome::Victory
    } else if objective >= pct(30) {
        CombatOutcome::Marginal
    } else {
        CombatOutcome::Defeat
    }
}

impl Resolver for SpecialForcesResolver {
    fn footprint(&self, engagement: &Engagement, world: &WorldState, _catalog: &Catalog) -> Footprint {
        let mut footprint = Footprint::of(engagement.participants());
        if let EngagementKind::SpecialForces(order) = &engagement.kind {
            if let (true, Some(at)) = (order.target.is_place(), order.target.location(world)) {
                let enemy = engagement.faction.opponent();
                let radius = order.target.radius().max(1);
                footprint.extend(world.operational_within(enemy, at, radius).map(|u| u.id));
            }
        }
        // Reads the issuing faction's fog of war.
        footprint.exclusive()
    }

    fn resolve(&self, engagement: &Engagement, ctx: &ResolveContext<'_>, rng: &mut TurnRng) -> Result<Resolution> {
        let EngagementKind::SpecialForces(order) = &engagement.kind else {
            return Err(ctx.wrong_kind(engagement));
        };
        let (team, spec) = ctx.issuer(engagement, Domain::SpecialForces)?;
        let stats = spec.special_forces.as_ref().ok_or_else(|| ctx.wrong_kind(engagement))?;
        let task = order.mission.task;
        let stealth = pct(i64::from(stats.stealth));

        let (target_unit, site_security, intel) = match order.target {
            Target::Unit(id) => {
                let target = ctx.target(id)?;
                (Some(target), security(target.dug_in), ctx.fog.confidence(engagement.faction, id))
            }
            Target::SupplyNode(id) => {
                ctx.world.node(id).ok_or_else(|| ctx.wrong_kind(engagement))?;
                (None, pct(50), Fixed::ZERO)
            }
            Target::Cell(_) | Target::Area { .. } => (None, pct(30), Fixed::ZERO),
        };

        let mut deltas = Vec::new();
        let mut targets: Vec<UnitId> = target_unit.iter().map(|u| u.id).collect();
        let detail = |compromised, objective: Fixed, extracted| EngagementDetail::SpecialForces {
            task,
            compromised,
            objective_percent: as_percent(objective),
            extracted,
        };

        // Infiltration.
        let detection = site_security
            * order.mission.insertion.risk()
            * (Fixed::ONE - stealth / 2)
            * (Fixed::ONE - intel * pct(30));
        let compromised = rng.chance(unit_clamp(detection));
        if compromised {
            deltas.push(StateDelta::MarkInCombat { unit: team.id });
            if !rng.chance(stealth / 2) {
                team_losses(team, pct(10), LossCause::Combat, &mut deltas);
                return Ok(Resolution::new(
                    engagement,
                    ctx.phase,
                    targets,
                    CombatOutcome::Defeat,
                    detail(true, Fixed::ZERO, true),
                    deltas,
                ));
            }
        }

        // Execution.
        let success = unit_clamp(
            pct(i64::from(stats.skill)) * (Fixed::ONE + intel * pct(30)) / task.difficulty(),
        );
        let full = rng.chance(success);
        let mut objective = if full {
            Fixed::ONE
        } else if rng.chance(success * pct(70)) {
            pct(50)
        } else {
            Fixed::ZERO
        };
        if compromised {
            objective *= pct(70);
        }
        if objective > Fixed::ZERO {
            execute(ctx, engagement, order.target, task, target_unit, objective, full, &mut targets, &mut deltas)?;
        }

        // Extraction.
        let pursuit = if compromised { pct(50) } else { pct(20) };
        let extracted = rng.chance(stealth * (Fixed::ONE - pursuit / 2));
        if !extracted {
            team_losses(team, pct(25), LossCause::Captured, &mut deltas);
        }

        Ok(Resolution::new(
            engagement,
            ctx.phase,
            targets,
            outcome(objective, compromised),
            detail(compromised, objective, extracted),
            deltas,
        ))
    }
}

fn team_losses(team: &Unit, fraction: Fixed, cause: LossCause, deltas: &mut Vec<StateDelta>) {
    let amount = casualties(team, fraction).max(1).min(team.strength);
    deltas.push(StateDelta::Casualties {
        unit: team.id,
        amount,
        cause,
    });
}

fn execute(
    ctx: &ResolveContext<'_>,
    engagement: &Engagement,
    target: Target,
    task: SfTask,
    target_unit: Option<&Unit>,
    objective: Fixed,
    full: bool,
    targets: &mut Vec<UnitId>,
    deltas: &mut Vec<StateDelta>,
) -> Result<()> {
    match (task, target_unit) {
        (SfTask::Recon, _) => {
            let confidence = if full { pct(90) } else { pct(70) };
            let observed: Vec<UnitId> = match (target_unit, target.location(ctx.world)) {
                (Some(unit), _) => vec![unit.id],
                (None, Some(at)) => ctx
                    .world
                    .operational_within(engagement.faction.opponent(), at, target.radius().max(1))
                    .map(|u| u.id)
                    .collect(),
                (None, None) => Vec::new(),
            };
            for unit in observed {
                if !targets.contains(&unit) {
                    targets.push(unit);
                }
                deltas.push(StateDelta::IntelBoost {
                    faction: engagement.faction,
                    unit,
                    confidence,
                    sensor: SensorKind::Recon,
                });
            }
        }
        (SfTask::Sabotage, None) => {
            if let Target::SupplyNode(node) = target {
                deltas.push(StateDelta::SupplyNodeDamage {
                    node,
                    amount: to_count(objective * fx(40)),
                });
            }
        }
        (SfTask::Sabotage, Some(unit)) => {
            deltas.push(StateDelta::Readiness {
                unit: unit.id,
                change: -(objective * pct(30)),
            });
            push_losses(unit, objective * pct(5), deltas);
        }
        (SfTask::Raid, Some(unit)) => {
            let vulnerability = ctx.platform(unit)?.target_class.vulnerability(unit.dug_in);
            push_losses(unit, objective * pct(15) * vulnerability, deltas);
            deltas.push(StateDelta::Suppress {
                unit: unit.id,
                amount: to_count(objective * fx(30)),
            });
            deltas.push(StateDelta::MarkInCombat { unit: unit.id });
        }
        (SfTask::DirectAction, Some(unit)) => {
            push_losses(unit, objective * pct(25), deltas);
            deltas.push(StateDelta::Organization {
                unit: unit.id,
                loss: to_count(objective * fx(30)),
            });
            deltas.push(StateDelta::MarkInCombat { unit: unit.id });
        }
        (SfTask::Raid | SfTask::DirectAction, None) => return Err(ctx.wrong_kind(engagement)),
    }
    Ok(())
}

fn push_losses(unit: &Unit, fraction: Fixed, deltas: &mut Vec<StateDelta>) {
    let amount = casualties(unit, fraction);
    if amount > 0 {
        deltas.push(StateDelta::Casualties {
            unit: unit.id,
            amount,
            cause: LossCause::Combat,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::testing::{engagement, losses, Arena};
    use crate::factions::FactionId;
    use crate::hex::HexCoord;
    use crate::logistics::SupplyNode;
    use crate::orders::{Insertion, Order, SpecialForcesMission};
    use crate::turn::Phase;

    fn mission(team: UnitId, task: SfTask, insertion: Insertion, target: Target) -> Engagement {
        engagement(
            FactionId::Blue,
            EngagementKind::SpecialForces(Order::new(team, SpecialForcesMission { task, insertion }, target)),
        )
    }

    fn run(arena: &Arena, order: &Engagement, seeds: std::ops::Range<u64>) -> Vec<Resolution> {
        seeds
            .map(|seed| {
                SpecialForcesResolver
                    .resolve(order, &arena.ctx(Phase::SpecialForces), &mut TurnRng::from_seed(seed))
                    .unwrap()
            })
            .collect()
    }

    fn was_compromised(r: &Resolution) -> bool {
        matches!(r.record.detail, EngagementDetail::SpecialForces { compromised: true, .. })
    }

    #[test]
    fn test_security_by_dug_in() {
        assert_eq!(security(0), pct(30));
        assert_eq!(security(3), pct(90));
    }

    #[test]
    fn test_helicopter_insertion_is_riskier_than_halo() {
        let mut arena = Arena::new();
        let team = arena.spawn(FactionId::Blue, "special_forces_group", 3, 3);
        let target = arena.spawn(FactionId::Red, "sp_artillery_regiment", 7, 3);
        arena.world.unit_mut(target).unwrap().dug_in = 3;
        let helo = run(&arena, &mission(team, SfTask::Raid, Insertion::Helicopter, Target::Unit(target)), 0..300);
        let halo = run(&arena, &mission(team, SfTask::Raid, Insertion::Halo, Target::Unit(target)), 0..300);
        let count = |rs: &[Resolution]| rs.iter().filter(|r| was_compromised(r)).count();
        assert!(count(&helo) > count(&halo));
    }

    #[test]
    fn test_recon_feeds_intel() {
        let mut arena = Arena::new();
        let team = arena.spawn(FactionId::Blue, "special_forces_group", 3, 3);
        let target = arena.spawn(FactionId::Red, "infantry_brigade", 7, 3);
        let results = run(&arena, &mission(team, SfTask::Recon, Insertion::Ground, Target::Unit(target)), 0..20);
        let boosts: Vec<Fixed> = results
            .iter()
            .flat_map(|r| &r.deltas)
            .filter_map(|d| match d {
                StateDelta::IntelBoost { unit, confidence, sensor: SensorKind::Recon, .. } if *unit == target => {
                    Some(*confidence)
                }
                _ => None,
            })
            .collect();
        assert!(!boosts.is_empty());
        assert!(boosts.iter().all(|c| *c == pct(90) || *c == pct(70)));
    }

    #[test]
    fn test_sabotage_damages_supply_node() {
        let mut arena = Arena::new();
        let team = arena.spawn(FactionId::Blue, "special_forces_group", 3, 3);
        arena
            .world
            .add_node(SupplyNode::new(1, FactionId::Red, HexCoord::new(6, 3)))
            .unwrap();
        let results = run(&arena, &mission(team, SfTask::Sabotage, Insertion::Ground, Target::SupplyNode(1)), 0..20);
        assert!(results.iter().any(|r| r
            .deltas
            .iter()
            .any(|d| matches!(d, StateDelta::SupplyNodeDamage { node: 1, amount } if *amount > 0))));
    }

    #[test]
    fn test_failed_extraction_means_captures() {
        let mut arena = Arena::new();
        let team = arena.spawn(FactionId::Blue, "special_forces_group", 3, 3);
        let target = arena.spawn(FactionId::Red, "infantry_brigade", 7, 3);
        let results = run(&arena, &mission(team, SfTask::DirectAction, Insertion::Ground, Target::Unit(target)), 0..200);
        let captured = results
            .iter()
            .filter(|r| matches!(r.record.detail, EngagementDetail::SpecialForces { extracted: false, .. }))
            .collect::<Vec<_>>();
        assert!(!captured.is_empty());
        for r in captured {
            assert!(r.deltas.contains(&StateDelta::Casualties {
                unit: team,
                amount: 10,
                cause: LossCause::Captured
            }));
            assert!(losses(r, team) >= 10);
        }
    }

    #[test]
    fn test_outcome_thresholds() {
        assert_eq!(outcome(Fixed::ONE, false), CombatOutcome::DecisiveVictory);
        assert_eq!(outcome(pct(70), true), CombatOutcome::Victory);
        assert_eq!(outcome(pct(35), true), CombatOutcome::Marginal);
        assert_eq!(outcome(Fixed::ZERO, false), CombatOutcome::Defeat);
    }
}
