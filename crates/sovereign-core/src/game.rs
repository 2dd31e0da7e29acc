use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use sovereign_protocol::{
    CityId, CivicId, Command, Event, GridPos, ImprovementId, PlayerId, PromotionId, TechId,
    UnitId, WorkKind, WorkOrder,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::city::City;
use crate::combat::CombatResolver;
use crate::config::EngineConfig;
use crate::fog::FogOfWar;
use crate::map::MapError;
use crate::mapgen::{find_start_positions, generate_map};
use crate::state::{GameState, MAX_PLAYERS};
use crate::turn::TurnOrchestrator;
use crate::unit::Unit;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("no players in game")]
    NoActivePlayer,
    #[error("unknown player")]
    UnknownPlayer,
    #[error("unknown unit")]
    UnknownUnit,
    #[error("unknown city")]
    UnknownCity,
    #[error("unit does not belong to current player")]
    NotYourUnit,
    #[error("city does not belong to current player")]
    NotYourCity,
    #[error("unit has no movement left")]
    NoMovesLeft,
    #[error("target tile is not adjacent")]
    NotAdjacent,
    #[error("target tile is off the map")]
    OutOfMap,
    #[error("terrain is impassable")]
    Impassable,
    #[error("tile is occupied by another player's unit")]
    Occupied,
    #[error("cannot attack your own unit")]
    CannotAttackOwnUnit,
    #[error("target is out of range")]
    OutOfRange,
    #[error("not at war with target")]
    NotAtWar,
    #[error("already at war with target")]
    AlreadyAtWar,
    #[error("cannot target yourself")]
    CannotTargetSelf,
    #[error("unit cannot found cities")]
    CannotFoundCity,
    #[error("a city already stands here")]
    CityAlreadyHere,
    #[error("unit is not a worker")]
    NotAWorker,
    #[error("unknown improvement")]
    UnknownImprovement,
    #[error("improvement not yet unlocked")]
    ImprovementLocked,
    #[error("cannot build improvement here")]
    CannotBuildImprovementHere,
    #[error("tile already has a road")]
    RoadAlreadyPresent,
    #[error("unknown technology")]
    UnknownTechnology,
    #[error("technology prerequisites not met")]
    TechPrerequisitesNotMet,
    #[error("technology already researched")]
    TechAlreadyResearched,
    #[error("unknown civic")]
    UnknownCivic,
    #[error("civic not yet unlocked")]
    CivicLocked,
    #[error("civic already adopted")]
    CivicAlreadyAdopted,
    #[error("unknown promotion")]
    UnknownPromotion,
    #[error("unit already has this promotion")]
    PromotionAlreadyKnown,
    #[error("promotion prerequisites not met")]
    PromotionPrerequisitesNotMet,
    #[error("not enough land for {needed} players (found {found} start tiles)")]
    NotEnoughLand { needed: usize, found: usize },
    #[error("{requested} players requested, at most {max} can be seated")]
    TooManyPlayers { requested: usize, max: usize },
    #[error(transparent)]
    Map(#[from] MapError),
}

/// A seat at a new game.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlayerSetup {
    pub name: String,
    pub is_ai: bool,
}

impl PlayerSetup {
    pub fn human(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_ai: false,
        }
    }

    pub fn ai(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_ai: true,
        }
    }
}

enum CombatRng {
    Thread,
    Seeded(StdRng),
}

/// Owns the game state and applies commands on behalf of the active player.
pub struct GameEngine {
    catalog: Arc<Catalog>,
    config: EngineConfig,
    state: GameState,
    fog: FogOfWar,
    combat: CombatResolver,
    turns: TurnOrchestrator,
    combat_rng: CombatRng,
}

impl GameEngine {
    /// Wrap an existing state. Fog is applied for the active player.
    pub fn new(catalog: Arc<Catalog>, config: EngineConfig, state: GameState) -> Self {
        let combat_rng = match config.combat_seed {
            Some(seed) => CombatRng::Seeded(StdRng::seed_from_u64(seed)),
            None => CombatRng::Thread,
        };
        let mut engine = Self {
            fog: FogOfWar::new(config.fog_radius),
            combat: CombatResolver::new(catalog.clone()),
            turns: TurnOrchestrator::new(catalog.clone()),
            catalog,
            config,
            state,
            combat_rng,
        };
        engine.fog.apply(&mut engine.state);
        engine
    }

    /// Generate a map, seat the players on spread-out start tiles and give
    /// each the configured starting units.
    pub fn new_game(
        catalog: Arc<Catalog>,
        config: EngineConfig,
        players: &[PlayerSetup],
    ) -> Result<Self, GameError> {
        if players.len() > MAX_PLAYERS {
            return Err(GameError::TooManyPlayers {
                requested: players.len(),
                max: MAX_PLAYERS,
            });
        }
        let map = generate_map(&catalog, &config.mapgen)?;
        let starts = find_start_positions(&catalog, &map, players.len());
        if starts.len() < players.len() {
            return Err(GameError::NotEnoughLand {
                needed: players.len(),
                found: starts.len(),
            });
        }

        let mut state = GameState::new(map);
        for (setup, start) in players.iter().zip(&starts) {
            let player = state
                .add_player(setup.name.clone(), setup.is_ai)
                .ok_or(GameError::TooManyPlayers {
                    requested: players.len(),
                    max: MAX_PLAYERS,
                })?;
            for data_id in &config.starting_units {
                match catalog.unit_type_id(data_id) {
                    Some(type_id) => {
                        state.spawn_unit(&catalog, type_id, player, *start);
                    }
                    None => warn!(unit = %data_id, "starting unit not in catalog, skipped"),
                }
            }
        }

        let fog = FogOfWar::new(config.fog_radius);
        let seated: Vec<PlayerId> = state.players.iter().map(|p| p.id).collect();
        for player in seated {
            fog.apply_for(&mut state, player);
        }
        info!(
            players = players.len(),
            width = config.mapgen.width,
            height = config.mapgen.height,
            seed = config.mapgen.seed,
            "new game"
        );
        Ok(Self::new(catalog, config, state))
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn fog(&self) -> &FogOfWar {
        &self.fog
    }

    pub fn turns(&self) -> &TurnOrchestrator {
        &self.turns
    }

    /// Like [`GameEngine::try_apply_command`], but a rejected command yields no events.
    pub fn apply_command(&mut self, command: Command) -> Vec<Event> {
        match self.try_apply_command(command) {
            Ok(events) => events,
            Err(err) => {
                debug!(%err, "command rejected");
                Vec::new()
            }
        }
    }

    pub fn try_apply_command(&mut self, command: Command) -> Result<Vec<Event>, GameError> {
        match command {
            Command::MoveUnit { unit, to } => self.move_unit(unit, to),
            Command::AttackUnit { attacker, defender } => self.attack_unit(attacker, defender),
            Command::ChoosePromotion { unit, promotion } => self.choose_promotion(unit, promotion),
            Command::BuildImprovement { unit, improvement } => {
                self.build_improvement(unit, improvement)
            }
            Command::BuildRoad { unit } => self.build_road(unit),
            Command::FoundCity { settler, name } => self.found_city(settler, name),
            Command::SetProduction { city, item } => self.set_production(city, &item),
            Command::EnqueueProduction { city, item } => self.enqueue_production(city, &item),
            Command::SetResearch { tech } => self.set_research(tech),
            Command::AdoptCivic { civic } => self.adopt_civic(civic),
            Command::EndTurn => self.end_turn(),
            Command::DeclareWar { target } => self.declare_war(target),
            Command::MakePeace { target } => self.make_peace(target),
        }
    }

    fn active_player(&self) -> Result<PlayerId, GameError> {
        self.state.active_player().ok_or(GameError::NoActivePlayer)
    }

    fn own_unit(&self, id: UnitId) -> Result<(PlayerId, &Unit), GameError> {
        let player = self.active_player()?;
        let unit = self.state.units.get(id).ok_or(GameError::UnknownUnit)?;
        if unit.owner != player {
            return Err(GameError::NotYourUnit);
        }
        Ok((player, unit))
    }

    fn own_city_mut(&mut self, id: CityId) -> Result<&mut City, GameError> {
        let player = self.active_player()?;
        let city = self.state.cities.get_mut(id).ok_or(GameError::UnknownCity)?;
        if city.owner != player {
            return Err(GameError::NotYourCity);
        }
        Ok(city)
    }

    fn is_passable(&self, pos: GridPos) -> Result<(), GameError> {
        let tile = self.state.map.tile(pos).ok_or(GameError::OutOfMap)?;
        match self.catalog.terrain(tile.terrain) {
            Some(t) if t.water || t.impassable => Err(GameError::Impassable),
            _ => Ok(()),
        }
    }

    fn move_unit(&mut self, unit_id: UnitId, to: GridPos) -> Result<Vec<Event>, GameError> {
        let (player, unit) = self.own_unit(unit_id)?;
        let from = unit.position;
        if unit.moves_left <= 0 {
            return Err(GameError::NoMovesLeft);
        }
        if !from.is_adjacent(to) {
            return Err(GameError::NotAdjacent);
        }
        self.is_passable(to)?;
        let blocked = self
            .state
            .units
            .iter_ordered()
            .any(|(_, u)| u.position == to && u.owner != player);
        if blocked {
            return Err(GameError::Occupied);
        }

        let cost = self
            .state
            .map
            .tile(to)
            .map_or(crate::catalog::DEFAULT_MOVE_COST, |t| self.catalog.move_cost(t.terrain));
        let unit = self
            .state
            .units
            .get_mut(unit_id)
            .ok_or(GameError::UnknownUnit)?;
        unit.position = to;
        unit.moves_left = (unit.moves_left - cost).max(0);
        unit.work = None;
        let moves_left = unit.moves_left;

        self.fog.apply(&mut self.state);
        Ok(vec![Event::UnitMoved {
            unit: unit_id,
            from,
            to,
            moves_left,
        }])
    }

    fn attack_unit(&mut self, attacker: UnitId, defender: UnitId) -> Result<Vec<Event>, GameError> {
        let (player, att) = self.own_unit(attacker)?;
        let def = self
            .state
            .units
            .get(defender)
            .ok_or(GameError::UnknownUnit)?;
        if def.owner == player {
            return Err(GameError::CannotAttackOwnUnit);
        }
        if !self.state.at_war(player, def.owner) {
            return Err(GameError::NotAtWar);
        }
        if att.moves_left <= 0 {
            return Err(GameError::NoMovesLeft);
        }
        let ranged = self.combat.is_ranged(att, def);
        if !ranged && !att.position.is_adjacent(def.position) {
            return Err(if att.range(&self.catalog) > 1 {
                GameError::OutOfRange
            } else {
                GameError::NotAdjacent
            });
        }
        let from = att.position;
        let defender_owner = def.owner;
        let move_cost = self
            .state
            .map
            .tile(def.position)
            .map_or(crate::catalog::DEFAULT_MOVE_COST, |t| self.catalog.move_cost(t.terrain));

        let report = match &mut self.combat_rng {
            CombatRng::Seeded(rng) => {
                self.combat
                    .resolve(&mut self.state, attacker, defender, move_cost, rng)
            }
            CombatRng::Thread => self.combat.resolve(
                &mut self.state,
                attacker,
                defender,
                move_cost,
                &mut rand::thread_rng(),
            ),
        }
        .ok_or(GameError::UnknownUnit)?;

        let mut events = vec![Event::CombatResolved {
            attacker,
            defender,
            outcome: report.outcome,
            damage: report.damage_dealt,
            ranged: report.ranged,
        }];
        if report.defender_died {
            events.push(Event::UnitDied {
                unit: defender,
                owner: defender_owner,
            });
        }
        if report.attacker_died {
            events.push(Event::UnitDied {
                unit: attacker,
                owner: player,
            });
        }
        if let Some(unit) = self.state.units.get_mut(attacker) {
            match report.advanced_to {
                Some(to) => events.push(Event::UnitMoved {
                    unit: attacker,
                    from,
                    to,
                    moves_left: unit.moves_left,
                }),
                // Attacking without advancing ends the unit's move.
                None => unit.moves_left = 0,
            }
        }

        self.fog.apply(&mut self.state);
        Ok(events)
    }

    fn choose_promotion(
        &mut self,
        unit_id: UnitId,
        promotion: PromotionId,
    ) -> Result<Vec<Event>, GameError> {
        let (_, unit) = self.own_unit(unit_id)?;
        let promo = self
            .catalog
            .promotion(promotion)
            .ok_or(GameError::UnknownPromotion)?;
        if unit.has_promotion(promotion) {
            return Err(GameError::PromotionAlreadyKnown);
        }
        if !promo.prerequisites.iter().all(|p| unit.has_promotion(*p)) {
            return Err(GameError::PromotionPrerequisitesNotMet);
        }
        if let Some(unit) = self.state.units.get_mut(unit_id) {
            unit.add_promotion(promotion);
        }
        Ok(vec![Event::UnitPromoted {
            unit: unit_id,
            promotion,
        }])
    }

    fn worker_at(&self, unit_id: UnitId) -> Result<(PlayerId, GridPos), GameError> {
        let (player, unit) = self.own_unit(unit_id)?;
        let is_worker = self
            .catalog
            .unit_type(unit.type_id)
            .is_some_and(|t| t.is_worker);
        if !is_worker {
            return Err(GameError::NotAWorker);
        }
        Ok((player, unit.position))
    }

    fn start_work(&mut self, unit_id: UnitId, at: GridPos, kind: WorkKind, turns: u8) -> Vec<Event> {
        if let Some(unit) = self.state.units.get_mut(unit_id) {
            unit.work = Some(WorkOrder {
                target: at,
                kind,
                turns_remaining: turns,
            });
        }
        vec![Event::WorkStarted {
            unit: unit_id,
            at,
            kind,
            turns,
        }]
    }

    fn build_improvement(
        &mut self,
        unit_id: UnitId,
        improvement: ImprovementId,
    ) -> Result<Vec<Event>, GameError> {
        let (player, at) = self.worker_at(unit_id)?;
        let imp = self
            .catalog
            .improvement(improvement)
            .ok_or(GameError::UnknownImprovement)?;
        let knows = self
            .state
            .player(player)
            .is_some_and(|p| p.knows_all(&imp.required_techs));
        if !knows {
            return Err(GameError::ImprovementLocked);
        }
        self.is_passable(at)
            .map_err(|_| GameError::CannotBuildImprovementHere)?;
        let tile = self.state.map.tile(at).ok_or(GameError::OutOfMap)?;
        if !imp.allows(tile.terrain) || tile.improvement == Some(improvement) {
            return Err(GameError::CannotBuildImprovementHere);
        }
        let turns = imp.build_turns;
        Ok(self.start_work(unit_id, at, WorkKind::Improvement(improvement), turns))
    }

    fn build_road(&mut self, unit_id: UnitId) -> Result<Vec<Event>, GameError> {
        let (_, at) = self.worker_at(unit_id)?;
        self.is_passable(at)
            .map_err(|_| GameError::CannotBuildImprovementHere)?;
        if self.state.map.tile(at).is_some_and(|t| t.road) {
            return Err(GameError::RoadAlreadyPresent);
        }
        let turns = self.config.road_build_turns.max(1);
        Ok(self.start_work(unit_id, at, WorkKind::Road, turns))
    }

    fn found_city(&mut self, settler: UnitId, name: String) -> Result<Vec<Event>, GameError> {
        let (player, unit) = self.own_unit(settler)?;
        let can_found = self
            .catalog
            .unit_type(unit.type_id)
            .is_some_and(|t| t.can_found_city);
        if !can_found {
            return Err(GameError::CannotFoundCity);
        }
        let at = unit.position;
        self.is_passable(at).map_err(|_| GameError::CannotFoundCity)?;
        if self.state.city_at(at).is_some() {
            return Err(GameError::CityAlreadyHere);
        }

        let name = if name.trim().is_empty() {
            format!("City {}", self.state.cities.len() + 1)
        } else {
            name.trim().to_string()
        };
        self.state.units.remove(settler);
        let city = self.state.found_city(name.clone(), player, at);
        info!(player = player.0, city = %name, x = at.x, y = at.y, "city founded");

        self.fog.apply(&mut self.state);
        Ok(vec![Event::CityFounded {
            city,
            owner: player,
            name,
            at,
        }])
    }

    fn set_production(&mut self, city_id: CityId, item: &str) -> Result<Vec<Event>, GameError> {
        let target = self.catalog.resolve_production(item);
        let city = self.own_city_mut(city_id)?;
        city.production_target = Some(target);
        self.refresh_city_cost(city_id)
    }

    fn enqueue_production(&mut self, city_id: CityId, item: &str) -> Result<Vec<Event>, GameError> {
        let target = self.catalog.resolve_production(item);
        let city = self.own_city_mut(city_id)?;
        city.production_queue.push_back(target);
        self.refresh_city_cost(city_id)
    }

    fn refresh_city_cost(&mut self, city_id: CityId) -> Result<Vec<Event>, GameError> {
        let city = self
            .state
            .cities
            .get_mut(city_id)
            .ok_or(GameError::UnknownCity)?;
        self.turns.production().refresh_cost(city);
        Ok(vec![Event::ProductionChanged {
            city: city_id,
            cost: city.production_cost,
        }])
    }

    fn set_research(&mut self, tech: TechId) -> Result<Vec<Event>, GameError> {
        let player = self.active_player()?;
        if self.catalog.tech(tech).is_none() {
            return Err(GameError::UnknownTechnology);
        }
        let p = self.state.player(player).ok_or(GameError::UnknownPlayer)?;
        if p.knows_tech(tech) {
            return Err(GameError::TechAlreadyResearched);
        }
        if !self.turns.research().can_research(p, tech) {
            return Err(GameError::TechPrerequisitesNotMet);
        }
        let p = self
            .state
            .player_mut(player)
            .ok_or(GameError::UnknownPlayer)?;
        if p.researching != Some(tech) {
            p.researching = Some(tech);
            p.research_progress = 0;
        }
        Ok(vec![Event::ResearchSet { player, tech }])
    }

    fn adopt_civic(&mut self, civic: CivicId) -> Result<Vec<Event>, GameError> {
        let player = self.active_player()?;
        let c = self.catalog.civic(civic).ok_or(GameError::UnknownCivic)?;
        let p = self
            .state
            .player_mut(player)
            .ok_or(GameError::UnknownPlayer)?;
        if !p.knows_all(&c.required_techs) {
            return Err(GameError::CivicLocked);
        }
        if p.civics.get(&c.category) == Some(&civic) {
            return Err(GameError::CivicAlreadyAdopted);
        }
        p.civics.insert(c.category.clone(), civic);
        Ok(vec![Event::CivicAdopted { player, civic }])
    }

    fn end_turn(&mut self) -> Result<Vec<Event>, GameError> {
        self.active_player()?;
        let events = self.turns.end_turn(&mut self.state);
        self.fog.apply(&mut self.state);
        Ok(events)
    }

    fn diplomacy_target(&self, target: PlayerId) -> Result<PlayerId, GameError> {
        let player = self.active_player()?;
        if self.state.player(target).is_none() {
            return Err(GameError::UnknownPlayer);
        }
        if target == player {
            return Err(GameError::CannotTargetSelf);
        }
        Ok(player)
    }

    fn declare_war(&mut self, target: PlayerId) -> Result<Vec<Event>, GameError> {
        let player = self.diplomacy_target(target)?;
        if self.state.at_war(player, target) {
            return Err(GameError::AlreadyAtWar);
        }
        self.state.set_war(player, target, true);
        info!(aggressor = player.0, target = target.0, "war declared");
        Ok(vec![Event::WarDeclared {
            aggressor: player,
            target,
        }])
    }

    fn make_peace(&mut self, target: PlayerId) -> Result<Vec<Event>, GameError> {
        let player = self.diplomacy_target(target)?;
        if !self.state.at_war(player, target) {
            return Err(GameError::NotAtWar);
        }
        self.state.set_war(player, target, false);
        info!(a = player.0, b = target.0, "peace made");
        Ok(vec![Event::PeaceMade {
            a: player,
            b: target,
        }])
    }
}
