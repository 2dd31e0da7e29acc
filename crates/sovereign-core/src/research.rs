use std::sync::Arc;

use sovereign_protocol::TechId;
use tracing::info;

use crate::catalog::Catalog;
use crate::player::Player;

pub struct ResearchTracker {
    catalog: Arc<Catalog>,
}

impl ResearchTracker {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// First tech in catalog order the player does not know. Prerequisites are not checked.
    pub fn next_unknown(&self, player: &Player) -> Option<TechId> {
        self.catalog
            .tech_order()
            .find(|id| !player.knows_tech(*id))
    }

    /// Whether `tech` may be targeted manually: unknown, with every prerequisite known.
    pub fn can_research(&self, player: &Player, tech: TechId) -> bool {
        let Some(t) = self.catalog.tech(tech) else {
            return false;
        };
        !player.knows_tech(tech) && player.knows_all(&t.prerequisites)
    }

    /// Add one turn of science: `1 + city_count + bonus`.
    ///
    /// Returns the tech completed this call, if any. On completion the next
    /// target is the first unknown tech in catalog order.
    pub fn advance(&self, player: &mut Player, city_count: usize, bonus: i32) -> Option<TechId> {
        let target = match player.researching {
            Some(t) if !player.knows_tech(t) => t,
            _ => {
                let t = self.next_unknown(player)?;
                player.researching = Some(t);
                player.research_progress = 0;
                t
            }
        };

        player.research_progress += 1 + city_count as i32 + bonus;

        let cost = self.catalog.tech(target).map_or(1, |t| t.cost);
        if player.research_progress < cost {
            return None;
        }

        player.learn_tech(target);
        player.research_progress = 0;
        player.researching = self.next_unknown(player);
        info!(player = player.id.0, tech = target.raw, "tech researched");
        Some(target)
    }
}
