use std::collections::BTreeMap;

use sovereign_protocol::{
    CivicId, DiplomaticStatus, PlayerId, ResourceId, TechId, TradeRoute,
};

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub is_ai: bool,
    /// Insertion-ordered set.
    pub known_techs: Vec<TechId>,
    pub researching: Option<TechId>,
    pub research_progress: i32,
    /// Adopted civic per category.
    pub civics: BTreeMap<String, CivicId>,
    /// Rebuilt by trade refresh.
    pub available_resources: Vec<ResourceId>,
    /// Rebuilt by trade refresh.
    pub trade_routes: Vec<TradeRoute>,
    pub diplomacy: BTreeMap<PlayerId, DiplomaticStatus>,
}

impl Player {
    pub fn new(id: PlayerId, name: String, is_ai: bool) -> Self {
        Self {
            id,
            name,
            is_ai,
            known_techs: Vec::new(),
            researching: None,
            research_progress: 0,
            civics: BTreeMap::new(),
            available_resources: Vec::new(),
            trade_routes: Vec::new(),
            diplomacy: BTreeMap::new(),
        }
    }

    pub fn knows_tech(&self, tech: TechId) -> bool {
        self.known_techs.contains(&tech)
    }

    pub fn knows_all(&self, techs: &[TechId]) -> bool {
        techs.iter().all(|t| self.knows_tech(*t))
    }

    pub fn learn_tech(&mut self, tech: TechId) -> bool {
        if self.knows_tech(tech) {
            return false;
        }
        self.known_techs.push(tech);
        true
    }

    pub fn has_resource(&self, resource: ResourceId) -> bool {
        self.available_resources.contains(&resource)
    }

    pub fn has_all_resources(&self, resources: &[ResourceId]) -> bool {
        resources.iter().all(|r| self.has_resource(*r))
    }

    pub fn is_at_war_with(&self, other: PlayerId) -> bool {
        self.diplomacy.get(&other).is_some_and(|d| d.at_war)
    }
}
