//! Fixed-wing air combat.
//!
//! Patrols and sweeps that meet an enemy patrol fight a beyond-visual-range
//! exchange (first look, then mutual salvos) followed by up to three
//! within-visual-range rounds. Air-to-ground sorties fly through the
//! defender's air-defense umbrella before attacking, unless they carry
//! standoff weapons.

use crate::catalog::{AirStats, Catalog};
use crate::combat::{
    casualties, covering_air_defense, interceptor_capacity, interceptor_use, loss_outcome,
    AirEngagement, CombatOutcome, Engagement, EngagementDetail, EngagementKind, Footprint,
    Resolution, ResolveContext, Resolver, StateDelta,
};
use crate::effects::EffectKind;
use crate::error::Result;
use crate::factions::FactionId;
use crate::math::{fx, pct, ratio, to_count, Fixed};
use crate::orders::{AirMission, Order};
use crate::rng::TurnRng;
use crate::unit::{Domain, LossCause, Unit, UnitId};
use crate::world::WorldState;

const BVR_MISSILES_PER_AIRCRAFT: u32 = 2;
const MUTUAL_SALVOS: u32 = 2;
const WVR_ROUNDS: u32 = 3;
const MIN_DETECTION_PERCENT: i64 = 10;

/// Air phase resolver.
#[derive(Debug, Clone, Copy, Default)]
pub struct AirResolver;

fn has_awacs(world: &WorldState, catalog: &Catalog, faction: FactionId) -> bool {
    world.any_operational(faction, Domain::Air, |u| {
        catalog
            .platform(&u.platform)
            .and_then(|s| s.air.as_ref())
            .is_some_and(|a| a.awacs)
    })
}

fn awacs_units(world: &WorldState, catalog: &Catalog, faction: FactionId) -> Vec<UnitId> {
    world
        .units_of(faction)
        .filter(|u| u.domain == Domain::Air)
        .filter(|u| {
            catalog
                .platform(&u.platform)
                .and_then(|s| s.air.as_ref())
                .is_some_and(|a| a.awacs)
        })
        .map(|u| u.id)
        .collect()
}

/// One side of an air-to-air fight.
struct Flight<'a> {
    unit: &'a Unit,
    stats: &'a AirStats,
    stealth: u32,
    alive: u32,
    ammo: u32,
    fired: u32,
    damaged: u32,
}

impl<'a> Flight<'a> {
    fn new(ctx: &ResolveContext<'a>, unit: &'a Unit) -> Result<Self> {
        let spec = ctx.platform(unit)?;
        let stats = spec.air.as_ref().ok_or_else(|| {
            crate::error::EngineError::contract(ctx.phase, format!("unit {} has no air ratings", unit.id))
        })?;
        Ok(Self {
            unit,
            stats,
            stealth: spec.stealth,
            alive: unit.strength,
            ammo: unit.ammo,
            fired: 0,
            damaged: 0,
        })
    }

    /// Detection quality against an enemy with `enemy_stealth`.
    fn detection(&self, ctx: &ResolveContext<'_>, enemy_stealth: u32) -> Fixed {
        let jam = ctx.effects.level(self.unit.faction, EffectKind::RadarJam);
        let radar = fx(self.stats.radar) * (Fixed::ONE - jam * pct(50));
        let awacs = if has_awacs(ctx.world, ctx.catalog, self.unit.faction) {
            pct(150) * (Fixed::ONE - jam * pct(30))
        } else {
            Fixed::ONE
        };
        ((radar * awacs - fx(enemy_stealth)) / 100).max(pct(MIN_DETECTION_PERCENT))
    }

    /// Fire one salvo; returns kills.
    fn salvo(&mut self, rng: &mut TurnRng, pk: Fixed, enemy_alive: u32) -> u32 {
        let missiles = (self.alive * BVR_MISSILES_PER_AIRCRAFT).min(self.ammo);
        self.ammo -= missiles;
        self.fired += missiles;
        let kills = (0..missiles).filter(|_| rng.chance(pk)).count() as u32;
        kills.min(enemy_alive)
    }

    /// One within-visual-range round; returns kills.
    fn dogfight(&mut self, rng: &mut TurnRng, enemy: &mut Flight<'_>) -> u32 {
        let pk = pct(i64::from(self.stats.agility)) * pct(30);
        let mut kills = 0;
        for _ in 0..self.alive {
            if rng.chance(pk) {
                if rng.chance(pct(70)) {
                    kills += 1;
                } else {
                    enemy.damaged += 1;
                }
            }
        }
        kills.min(enemy.alive)
    }

    fn deltas(&self, deltas: &mut Vec<StateDelta>, cap: Option<crate::hex::HexCoord>) {
        let id = self.unit.id;
        let lost = self.unit.strength - self.alive;
        if lost > 0 {
            deltas.push(StateDelta::Casualties {
                unit: id,
                amount: lost,
                cause: LossCause::Combat,
            });
        }
        if self.damaged > 0 {
            let change = -(ratio(fx(self.damaged), fx(self.unit.strength)) * pct(50));
            deltas.push(StateDelta::Readiness { unit: id, change });
        }
        if self.fired > 0 {
            deltas.push(StateDelta::ExpendAmmo {
                unit: id,
                amount: self.fired,
            });
        }
        deltas.push(StateDelta::MarkInCombat { unit: id });
        deltas.push(StateDelta::StandingCap { unit: id, cell: cap });
    }
}

fn standing_cap(order: &Order<AirMission>, world: &WorldState) -> Option<crate::hex::HexCoord> {
    if order.mission == AirMission::Cap {
        order.target.location(world)
    } else {
        None
    }
}

impl AirResolver {
    fn duel(
        engagement: &Engagement,
        ctx: &ResolveContext<'_>,
        rng: &mut TurnRng,
        order: &Order<AirMission>,
        opponent: &Order<AirMission>,
    ) -> Result<Resolution> {
        let (unit, _) = ctx.issuer(engagement, Domain::Air)?;
        let enemy_unit = ctx.target(opponent.unit)?;
        let mut a = Flight::new(ctx, unit)?;
        let mut b = Flight::new(ctx, enemy_unit)?;

        let det_a = a.detection(ctx, b.stealth);
        let det_b = b.detection(ctx, a.stealth);
        let pk_a = pct(75) * det_a.min(Fixed::ONE) * (Fixed::ONE - pct(i64::from(b.stats.ew_suite)) / 2);
        let pk_b = pct(75) * det_b.min(Fixed::ONE) * (Fixed::ONE - pct(i64::from(a.stats.ew_suite)) / 2);

        // First look goes to the better sensor picture; the initiator wins ties.
        let a_first = det_a >= det_b;
        let (lead, trail) = if a_first { (det_a, det_b) } else { (det_b, det_a) };
        let look_salvos = if lead >= trail * pct(150) { 2 } else { 1 };
        for _ in 0..look_salvos {
            if a_first {
                b.alive -= a.salvo(rng, pk_a, b.alive);
            } else {
                a.alive -= b.salvo(rng, pk_b, a.alive);
            }
        }

        for _ in 0..MUTUAL_SALVOS {
            let kills_a = a.salvo(rng, pk_a, b.alive);
            let kills_b = b.salvo(rng, pk_b, a.alive);
            b.alive -= kills_a;
            a.alive -= kills_b;
        }

        let mut wvr_rounds = 0;
        while wvr_rounds < WVR_ROUNDS && a.alive > 0 && b.alive > 0 {
            wvr_rounds += 1;
            let kills_a = a.dogfight(rng, &mut b);
            let kills_b = b.dogfight(rng, &mut a);
            b.alive -= kills_a;
            a.alive -= kills_b;
        }

        let attacker_losses = unit.strength - a.alive;
        let defender_losses = enemy_unit.strength - b.alive;
        let outcome = if attacker_losses == 0 && defender_losses > 0 {
            CombatOutcome::DecisiveVictory
        } else if attacker_losses == defender_losses {
            CombatOutcome::Stalemate
        } else {
            let exchange = ratio(fx(defender_losses), fx(attacker_losses));
            if exchange >= Fixed::from_num(2) {
                CombatOutcome::DecisiveVictory
            } else if exchange > Fixed::ONE {
                CombatOutcome::Victory
            } else {
                CombatOutcome::Defeat
            }
        };

        let mut deltas = Vec::new();
        a.deltas(&mut deltas, standing_cap(order, ctx.world));
        b.deltas(&mut deltas, standing_cap(opponent, ctx.world));

        Ok(Resolution::new(
            engagement,
            ctx.phase,
            vec![enemy_unit.id],
            outcome,
            EngagementDetail::AirCombat {
                attacker_losses,
                defender_losses,
                first_look: Some(if a_first { unit.faction } else { enemy_unit.faction }),
                wvr_rounds,
            },
            deltas,
        ))
    }

    fn patrol(engagement: &Engagement, ctx: &ResolveContext<'_>, order: &Order<AirMission>) -> Result<Resolution> {
        let (unit, _) = ctx.issuer(engagement, Domain::Air)?;
        let cell = order.target.location(ctx.world).unwrap_or(unit.position);
        let deltas = vec![StateDelta::StandingCap {
            unit: unit.id,
            cell: standing_cap(order, ctx.world),
        }];
        Ok(Resolution::new(
            engagement,
            ctx.phase,
            Vec::new(),
            CombatOutcome::Stalemate,
            EngagementDetail::AirSuperiority { cell },
            deltas,
        ))
    }

    fn strike(
        engagement: &Engagement,
        ctx: &ResolveContext<'_>,
        rng: &mut TurnRng,
        order: &Order<AirMission>,
    ) -> Result<Resolution> {
        let (unit, spec) = ctx.issuer(engagement, Domain::Air)?;
        let flight = Flight::new(ctx, unit)?;
        let target_id = order.target.unit().ok_or_else(|| ctx.wrong_kind(engagement))?;
        let target = ctx.target(target_id)?;
        let target_spec = ctx.platform(target)?;
        let defender = target.faction;
        let mut deltas = Vec::new();

        // Ingress through the air-defense umbrella.
        let mut alive = unit.strength;
        if !flight.stats.standoff {
            let jam = ctx.effects.level(defender, EffectKind::RadarJam);
            let evasion = (Fixed::ONE - pct(i64::from(flight.stats.ew_suite)) / 2)
                * (Fixed::ONE - pct(i64::from(spec.stealth)));
            for (ad_unit, _) in covering_air_defense(ctx.world, ctx.catalog, defender, target.position) {
                let ad_spec = ctx.platform(ad_unit)?;
                let Some(ad) = &ad_spec.air_defense else { continue };
                let shots = interceptor_capacity(ad_unit, ad_spec).min(2).min(alive);
                let pk = pct(i64::from(ad.interceptor_pk)) * (Fixed::ONE - jam * pct(50)) * evasion;
                let kills = (0..shots).filter(|_| rng.chance(pk)).count() as u32;
                alive -= kills.min(alive);
                interceptor_use(ad_unit.id, shots, &mut deltas);
            }
        }
        let aircraft_lost = unit.strength - alive;

        let (hits, amount, fraction, expended) = if order.mission == AirMission::Sead {
            let radar = target_spec.air_defense.as_ref().map_or(0, |ad| ad.radar);
            let pk = pct(65) * pct(i64::from(radar));
            let arms = alive.div_ceil(4).min(unit.ammo);
            let hits = (0..arms).filter(|_| rng.chance(pk)).count() as u32;
            let amount = hits.min(target.strength);
            if hits > 0 {
                deltas.push(StateDelta::Suppress {
                    unit: target.id,
                    amount: (hits * 20).min(80),
                });
            }
            (hits, amount, ratio(fx(amount), fx(target.strength)), arms)
        } else {
            let hits = fx(alive) * pct(i64::from(flight.stats.ground_attack)) * ctx.env.air_ops();
            let vulnerability = target_spec.target_class.vulnerability(target.dug_in);
            let fraction = rng.roll(hits * pct(2) * vulnerability, pct(20)).min(pct(50));
            let amount = casualties(target, fraction);
            (to_count(hits), amount, fraction, alive.min(unit.ammo))
        };

        if aircraft_lost > 0 {
            deltas.push(StateDelta::Casualties {
                unit: unit.id,
                amount: aircraft_lost,
                cause: LossCause::Combat,
            });
        }
        if amount > 0 {
            deltas.push(StateDelta::Casualties {
                unit: target.id,
                amount,
                cause: LossCause::Combat,
            });
        }
        if expended > 0 {
            deltas.push(StateDelta::ExpendAmmo {
                unit: unit.id,
                amount: expended,
            });
        }
        deltas.push(StateDelta::MarkInCombat { unit: unit.id });
        deltas.push(StateDelta::MarkInCombat { unit: target.id });
        deltas.push(StateDelta::StandingCap {
            unit: unit.id,
            cell: None,
        });

        Ok(Resolution::new(
            engagement,
            ctx.phase,
            vec![target.id],
            loss_outcome(fraction),
            EngagementDetail::AirStrike {
                mission: order.mission,
                aircraft_lost,
                hits,
                casualties: amount,
            },
            deltas,
        ))
    }
}

impl Resolver for AirResolver {
    fn footprint(&self, engagement: &Engagement, world: &WorldState, catalog: &Catalog) -> Footprint {
        let mut footprint = Footprint::of(engagement.participants());
        match &engagement.kind {
            EngagementKind::Air(AirEngagement::Duel { .. }) => {
                for faction in FactionId::ALL {
                    footprint.extend(awacs_units(world, catalog, faction));
                }
            }
            EngagementKind::Air(AirEngagement::Strike(order)) => {
                if let Some(at) = order.target.location(world) {
                    let defenders = covering_air_defense(world, catalog, engagement.faction.opponent(), at);
                    footprint.extend(defenders.iter().map(|(u, _)| u.id));
                }
            }
            _ => {}
        }
        footprint
    }

    fn resolve(&self, engagement: &Engagement, ctx: &ResolveContext<'_>, rng: &mut TurnRng) -> Result<Resolution> {
        match &engagement.kind {
            EngagementKind::Air(AirEngagement::Duel { order, opponent }) => {
                Self::duel(engagement, ctx, rng, order, opponent)
            }
            EngagementKind::Air(AirEngagement::Patrol(order)) => Self::patrol(engagement, ctx, order),
            EngagementKind::Air(AirEngagement::Strike(order)) => Self::strike(engagement, ctx, rng, order),
            _ => Err(ctx.wrong_kind(engagement)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::testing::{engagement, losses, Arena};
    use crate::hex::HexCoord;
    use crate::orders::Target;
    use crate::turn::Phase;

    fn cap(unit: UnitId) -> Order<AirMission> {
        Order::new(unit, AirMission::Cap, Target::Cell(HexCoord::new(10, 10)))
    }

    #[test]
    fn test_duel_conserves_aircraft() {
        let mut arena = Arena::new();
        let blue = arena.spawn(FactionId::Blue, "fighter_squadron", 8, 10);
        let red = arena.spawn(FactionId::Red, "fighter_squadron", 12, 10);
        let kind = EngagementKind::Air(AirEngagement::Duel {
            order: cap(blue),
            opponent: Order::new(red, AirMission::Sweep, Target::Cell(HexCoord::new(10, 10))),
        });
        for seed in 0..10 {
            let resolution = AirResolver
                .resolve(&engagement(FactionId::Blue, kind.clone()), &arena.ctx(Phase::Air), &mut TurnRng::from_seed(seed))
                .unwrap();
            assert!(losses(&resolution, blue) <= 16);
            assert!(losses(&resolution, red) <= 16);
            assert!(resolution.deltas.contains(&StateDelta::StandingCap {
                unit: blue,
                cell: Some(HexCoord::new(10, 10)),
            }));
            assert!(resolution
                .deltas
                .contains(&StateDelta::StandingCap { unit: red, cell: None }));
        }
    }

    #[test]
    fn test_awacs_gives_first_look() {
        let mut arena = Arena::new();
        let blue = arena.spawn(FactionId::Blue, "fighter_squadron", 8, 10);
        arena.spawn(FactionId::Blue, "awacs_flight", 4, 10);
        let red = arena.spawn(FactionId::Red, "fighter_squadron", 12, 10);
        let kind = EngagementKind::Air(AirEngagement::Duel {
            order: cap(red),
            opponent: cap(blue),
        });
        let resolution = AirResolver
            .resolve(&engagement(FactionId::Red, kind), &arena.ctx(Phase::Air), &mut TurnRng::from_seed(2))
            .unwrap();
        match resolution.record.detail {
            EngagementDetail::AirCombat { first_look, .. } => assert_eq!(first_look, Some(FactionId::Blue)),
            _ => panic!("not an air combat record"),
        }
    }

    #[test]
    fn test_radar_jam_degrades_detection() {
        let mut arena = Arena::new();
        let blue = arena.spawn(FactionId::Blue, "fighter_squadron", 8, 10);
        let detection = |arena: &Arena| {
            let ctx = arena.ctx(Phase::Air);
            let unit = ctx.world.unit(blue).unwrap();
            Flight::new(&ctx, unit).unwrap().detection(&ctx, 0)
        };
        let clear = detection(&arena);
        arena.effects.apply(FactionId::Blue, EffectKind::RadarJam, pct(60));
        let jammed = detection(&arena);
        assert!(jammed < clear);
        assert!(jammed >= pct(MIN_DETECTION_PERCENT));
    }

    #[test]
    fn test_jammed_initiator_loses_first_look() {
        let mut arena = Arena::new();
        let blue = arena.spawn(FactionId::Blue, "fighter_squadron", 8, 10);
        let red = arena.spawn(FactionId::Red, "fighter_squadron", 12, 10);
        let kind = EngagementKind::Air(AirEngagement::Duel {
            order: cap(blue),
            opponent: cap(red),
        });
        let first_look = |arena: &Arena| {
            let resolution = AirResolver
                .resolve(&engagement(FactionId::Blue, kind.clone()), &arena.ctx(Phase::Air), &mut TurnRng::from_seed(4))
                .unwrap();
            match resolution.record.detail {
                EngagementDetail::AirCombat { first_look, .. } => first_look,
                _ => panic!("not an air combat record"),
            }
        };
        assert_eq!(first_look(&arena), Some(FactionId::Blue));
        arena.effects.apply(FactionId::Blue, EffectKind::RadarJam, pct(60));
        assert_eq!(first_look(&arena), Some(FactionId::Red));
    }

    #[test]
    fn test_radar_jam_weakens_air_defense_on_ingress() {
        let mut arena = Arena::new();
        let blue = arena.spawn(FactionId::Blue, "fighter_squadron", 4, 10);
        let target = arena.spawn(FactionId::Red, "infantry_brigade", 10, 10);
        arena.spawn(FactionId::Red, "sam_long_range", 11, 10);
        let order = Order::new(blue, AirMission::Strike, Target::Unit(target));
        let shot_down = |arena: &Arena| -> u32 {
            (0..40)
                .map(|seed| {
                    let resolution = AirResolver
                        .resolve(
                            &engagement(FactionId::Blue, EngagementKind::Air(AirEngagement::Strike(order.clone()))),
                            &arena.ctx(Phase::Air),
                            &mut TurnRng::from_seed(seed),
                        )
                        .unwrap();
                    losses(&resolution, blue)
                })
                .sum()
        };
        let clear = shot_down(&arena);
        arena.effects.apply(FactionId::Red, EffectKind::RadarJam, Fixed::ONE);
        let jammed = shot_down(&arena);
        assert!(clear > 0);
        assert!(jammed < clear);
    }

    #[test]
    fn test_uncontested_patrol_holds_the_air() {
        let mut arena = Arena::new();
        let blue = arena.spawn(FactionId::Blue, "fighter_squadron", 8, 10);
        let resolution = AirResolver
            .resolve(
                &engagement(FactionId::Blue, EngagementKind::Air(AirEngagement::Patrol(cap(blue)))),
                &arena.ctx(Phase::Air),
                &mut TurnRng::from_seed(0),
            )
            .unwrap();
        assert_eq!(
            resolution.record.detail,
            EngagementDetail::AirSuperiority {
                cell: HexCoord::new(10, 10)
            }
        );
        assert_eq!(resolution.outcome, CombatOutcome::Stalemate);
    }

    #[test]
    fn test_standoff_strike_skips_air_defense() {
        let mut arena = Arena::new();
        let blue = arena.spawn(FactionId::Blue, "strike_squadron", 4, 10);
        let target = arena.spawn(FactionId::Red, "infantry_brigade", 10, 10);
        arena.spawn(FactionId::Red, "sam_long_range", 11, 10);
        let order = Order::new(blue, AirMission::Strike, Target::Unit(target));
        let resolution = AirResolver
            .resolve(
                &engagement(FactionId::Blue, EngagementKind::Air(AirEngagement::Strike(order))),
                &arena.ctx(Phase::Air),
                &mut TurnRng::from_seed(5),
            )
            .unwrap();
        assert_eq!(losses(&resolution, blue), 0);
        assert!(losses(&resolution, target) > 0);
        assert!(!resolution
            .deltas
            .iter()
            .any(|d| matches!(d, StateDelta::UseChannels { .. })));
    }

    #[test]
    fn test_sead_damages_air_defense() {
        let mut arena = Arena::new();
        let blue = arena.spawn(FactionId::Blue, "fighter_squadron", 4, 10);
        let sam = arena.spawn(FactionId::Red, "sam_long_range", 11, 10);
        let order = Order::new(blue, AirMission::Sead, Target::Unit(sam));
        let total: u32 = (0..20)
            .map(|seed| {
                let resolution = AirResolver
                    .resolve(
                        &engagement(FactionId::Blue, EngagementKind::Air(AirEngagement::Strike(order.clone()))),
                        &arena.ctx(Phase::Air),
                        &mut TurnRng::from_seed(seed),
                    )
                    .unwrap();
                losses(&resolution, sam)
            })
            .sum();
        assert!(total > 0);
    }
}
