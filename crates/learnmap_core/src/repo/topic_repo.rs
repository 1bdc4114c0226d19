//! Topic collection.

use crate::model::topic::Topic;
use crate::repo::collection::{Collection, Entity};
use uuid::Uuid;

pub type TopicRepo = Collection<Topic>;

impl Entity for Topic {
    fn entity_id(&self) -> Uuid {
        self.id
    }

    fn is_active(&self) -> bool {
        Topic::is_active(self)
    }
}
