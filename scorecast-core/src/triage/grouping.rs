use serde::{Deserialize, Serialize};

use crate::domain::{CardId, CardKind, PriorityCard, PriorityLevel};

/// Exact clustering key for UI collapsing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub kind: CardKind,
    pub level: PriorityLevel,
    pub topic: Option<String>,
    pub thread_id: Option<String>,
}

impl GroupKey {
    pub fn of(card: &PriorityCard) -> Self {
        Self {
            kind: card.kind,
            level: card.level,
            topic: card.context.topic.clone(),
            thread_id: card.context.thread_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardGroup {
    pub key: GroupKey,
    pub card_ids: Vec<CardId>,
}

/// Cluster cards by [`GroupKey`]. Groups appear in order of their first
/// card; members keep input order.
pub fn group_cards<'a, I>(cards: I) -> Vec<CardGroup>
where
    I: IntoIterator<Item = &'a PriorityCard>,
{
    let mut groups: Vec<CardGroup> = Vec::new();
    for card in cards {
        let key = GroupKey::of(card);
        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => group.card_ids.push(card.id.clone()),
            None => groups.push(CardGroup {
                key,
                card_ids: vec![card.id.clone()],
            }),
        }
    }
    groups
}
