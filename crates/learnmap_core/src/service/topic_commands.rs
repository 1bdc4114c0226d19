//! Topic-level commands.
//!
//! # Invariants
//! - Every command except creation takes the caller's expected version and
//!   fails with `VersionConflict` when it is stale.
//! - Local state changes only after the server confirms, and then only to the
//!   confirmed copy.

use crate::error::{CoreError, CoreResult, EntityKind};
use crate::model::require_title;
use crate::model::template::{TemplateOverrides, TopicTemplate};
use crate::model::topic::{
    AttachmentDraft, ReferenceAttachment, ReferenceInfo, ReferenceLink, Topic, TopicDraft,
    TopicId, TopicStatus,
};
use crate::model::user::{Permission, UserId};
use crate::service::child_commands::{goal_record_from_draft, task_record_from_draft};
use crate::service::topic_service::TopicService;
use crate::service::version_gate::{check_confirmed_version, ensure_version, reject, settle, transport};
use crate::sync::normalizer::{goal_from_record, task_from_record, topic_from_record};
use crate::sync::records::{CollaboratorRecord, TopicPatch, TopicRecord};
use crate::ValidationError;
use log::info;
use uuid::Uuid;

impl TopicService {
    /// Creates a topic owned by the session user; it is listed first.
    pub fn create_topic(&mut self, draft: TopicDraft) -> CoreResult<Topic> {
        let title = draft
            .validated_title()
            .map_err(|err| reject("topic_create", err))?;
        let record = self.new_topic_record(title, &draft, None);
        let topic = self.insert_topic_record(record, "topic_create")?;
        Ok(topic)
    }

    /// Creates a topic and copies the template's goal/task skeleton into it.
    ///
    /// Children are stored as the server confirms them; a transport failure
    /// part-way leaves exactly the confirmed prefix in place.
    pub fn create_topic_from_template(
        &mut self,
        template: &TopicTemplate,
        overrides: &TemplateOverrides,
    ) -> CoreResult<Topic> {
        template
            .validate(overrides)
            .map_err(|err| reject("topic_create_from_template", err))?;
        let draft = template.topic_draft(overrides);
        let title = draft
            .validated_title()
            .map_err(|err| reject("topic_create_from_template", err))?;
        let record = self.new_topic_record(title, &draft, Some(template.id));
        let topic = self.insert_topic_record(record, "topic_create_from_template")?;

        for (goal_index, goal_template) in template.goals.iter().enumerate() {
            let goal_draft = goal_template.draft();
            let goal_title = goal_draft
                .validated_title()
                .map_err(|err| reject("topic_create_from_template", err))?;
            let goal_record = goal_record_from_draft(
                topic.id,
                goal_title,
                &goal_draft,
                goal_index as i64,
                self.session_user,
                self.now(),
            );
            let confirmed = self
                .remote
                .insert_goal(goal_record)
                .map_err(|err| transport("topic_create_from_template", EntityKind::Goal, err))?;
            let goal_id = confirmed.id;
            self.stores
                .attach_goal(goal_from_record(confirmed, Vec::new(), &self.directory));

            for (task_index, task_template) in goal_template.tasks.iter().enumerate() {
                let task_draft = task_template.draft();
                let task_title = task_draft
                    .validated_title()
                    .map_err(|err| reject("topic_create_from_template", err))?;
                let task_record = task_record_from_draft(
                    goal_id,
                    task_title,
                    &task_draft,
                    task_index as i64,
                    self.session_user,
                    self.now(),
                );
                let confirmed = self
                    .remote
                    .insert_task(task_record)
                    .map_err(|err| transport("topic_create_from_template", EntityKind::Task, err))?;
                self.stores
                    .attach_task(task_from_record(confirmed, &self.directory));
            }
        }

        info!(
            "event=topic_create_from_template module=service status=ok goals={}",
            template.goals.len()
        );
        self.stores
            .topics
            .get(topic.id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(EntityKind::Topic, topic.id))
    }

    /// Applies a caller-built patch to a topic.
    pub fn update_topic(
        &mut self,
        topic_id: TopicId,
        expected_version: u64,
        patch: TopicPatch,
    ) -> CoreResult<Topic> {
        patch.validate().map_err(|err| reject("topic_update", err))?;
        self.commit_topic(topic_id, expected_version, &patch, "topic_update")
    }

    /// Soft-deletes a topic; `restore_topic` undoes it.
    pub fn delete_topic(&mut self, topic_id: TopicId, expected_version: u64) -> CoreResult<Topic> {
        let patch = TopicPatch {
            status: Some(TopicStatus::Archived),
            ..TopicPatch::default()
        };
        self.commit_topic(topic_id, expected_version, &patch, "topic_delete")
    }

    pub fn restore_topic(&mut self, topic_id: TopicId, expected_version: u64) -> CoreResult<Topic> {
        let patch = TopicPatch {
            status: Some(TopicStatus::Active),
            ..TopicPatch::default()
        };
        self.commit_topic(topic_id, expected_version, &patch, "topic_restore")
    }

    pub fn add_reference_link(
        &mut self,
        topic_id: TopicId,
        expected_version: u64,
        title: &str,
        url: &str,
    ) -> CoreResult<Topic> {
        let (title, url) = reference_fields(title, url).map_err(|err| reject("reference_add", err))?;
        let mut info = self.topic_for_edit(topic_id, expected_version)?.reference_info.clone();
        info.links.push(ReferenceLink {
            id: Uuid::new_v4(),
            title,
            url,
            created_at: self.now(),
        });
        self.commit_reference_info(topic_id, expected_version, info, "reference_add")
    }

    pub fn remove_reference_link(
        &mut self,
        topic_id: TopicId,
        expected_version: u64,
        link_id: Uuid,
    ) -> CoreResult<Topic> {
        let mut info = self.topic_for_edit(topic_id, expected_version)?.reference_info.clone();
        let before = info.links.len();
        info.links.retain(|link| link.id != link_id);
        if info.links.len() == before {
            return Err(CoreError::not_found(EntityKind::Reference, link_id));
        }
        self.commit_reference_info(topic_id, expected_version, info, "reference_remove")
    }

    pub fn add_reference_attachment(
        &mut self,
        topic_id: TopicId,
        expected_version: u64,
        draft: AttachmentDraft,
    ) -> CoreResult<Topic> {
        let (title, url) =
            reference_fields(&draft.title, &draft.url).map_err(|err| reject("reference_add", err))?;
        let mut info = self.topic_for_edit(topic_id, expected_version)?.reference_info.clone();
        info.attachments.push(ReferenceAttachment {
            id: Uuid::new_v4(),
            title,
            url,
            file_type: draft.file_type,
            size_bytes: draft.size_bytes,
            created_at: self.now(),
        });
        self.commit_reference_info(topic_id, expected_version, info, "reference_add")
    }

    pub fn remove_reference_attachment(
        &mut self,
        topic_id: TopicId,
        expected_version: u64,
        attachment_id: Uuid,
    ) -> CoreResult<Topic> {
        let mut info = self.topic_for_edit(topic_id, expected_version)?.reference_info.clone();
        let before = info.attachments.len();
        info.attachments.retain(|attachment| attachment.id != attachment_id);
        if info.attachments.len() == before {
            return Err(CoreError::not_found(EntityKind::Reference, attachment_id));
        }
        self.commit_reference_info(topic_id, expected_version, info, "reference_remove")
    }

    pub fn enable_collaboration(
        &mut self,
        topic_id: TopicId,
        expected_version: u64,
    ) -> CoreResult<Topic> {
        let patch = TopicPatch {
            is_collaborative: Some(true),
            ..TopicPatch::default()
        };
        self.commit_topic(topic_id, expected_version, &patch, "collaboration_enable")
    }

    /// Turns sharing off; existing collaborator entries are kept for re-enabling.
    pub fn disable_collaboration(
        &mut self,
        topic_id: TopicId,
        expected_version: u64,
    ) -> CoreResult<Topic> {
        let patch = TopicPatch {
            is_collaborative: Some(false),
            ..TopicPatch::default()
        };
        self.commit_topic(topic_id, expected_version, &patch, "collaboration_disable")
    }

    /// Adds a collaborator; also switches the topic to collaborative.
    pub fn invite_collaborator(
        &mut self,
        topic_id: TopicId,
        expected_version: u64,
        user_id: UserId,
        permission: Permission,
    ) -> CoreResult<Topic> {
        self.directory.ensure_loaded(self.users.as_ref());
        let invited_at = self.now();
        let topic = self.topic_for_edit(topic_id, expected_version)?;
        if topic.owner.id() == user_id {
            return Err(reject(
                "collaborator_invite",
                ValidationError::new("user_id", "the owner cannot be invited as a collaborator"),
            ));
        }
        if topic.collaborator(user_id).is_some() {
            return Err(reject(
                "collaborator_invite",
                ValidationError::new("user_id", "user is already a collaborator"),
            ));
        }
        if !self.directory.is_empty() && self.directory.get(user_id).is_none() {
            return Err(CoreError::not_found(EntityKind::User, user_id));
        }

        let mut collaborators = collaborator_records(topic);
        collaborators.push(CollaboratorRecord {
            user_id,
            permission,
            invited_at: Some(invited_at),
        });
        let patch = TopicPatch {
            topic_collaborators: Some(collaborators),
            is_collaborative: (!topic.is_collaborative).then_some(true),
            ..TopicPatch::default()
        };
        self.commit_topic(topic_id, expected_version, &patch, "collaborator_invite")
    }

    pub fn update_collaborator_permission(
        &mut self,
        topic_id: TopicId,
        expected_version: u64,
        user_id: UserId,
        permission: Permission,
    ) -> CoreResult<Topic> {
        let topic = self.topic_for_edit(topic_id, expected_version)?;
        if topic.collaborator(user_id).is_none() {
            return Err(CoreError::not_found(EntityKind::User, user_id));
        }
        let collaborators = collaborator_records(topic)
            .into_iter()
            .map(|mut entry| {
                if entry.user_id == user_id {
                    entry.permission = permission;
                }
                entry
            })
            .collect();
        let patch = TopicPatch {
            topic_collaborators: Some(collaborators),
            ..TopicPatch::default()
        };
        self.commit_topic(topic_id, expected_version, &patch, "collaborator_permission")
    }

    pub fn remove_collaborator(
        &mut self,
        topic_id: TopicId,
        expected_version: u64,
        user_id: UserId,
    ) -> CoreResult<Topic> {
        let topic = self.topic_for_edit(topic_id, expected_version)?;
        if topic.collaborator(user_id).is_none() {
            return Err(CoreError::not_found(EntityKind::User, user_id));
        }
        let collaborators = collaborator_records(topic)
            .into_iter()
            .filter(|entry| entry.user_id != user_id)
            .collect();
        let patch = TopicPatch {
            topic_collaborators: Some(collaborators),
            ..TopicPatch::default()
        };
        self.commit_topic(topic_id, expected_version, &patch, "collaborator_remove")
    }

    fn new_topic_record(
        &self,
        title: String,
        draft: &TopicDraft,
        template_id: Option<Uuid>,
    ) -> TopicRecord {
        TopicRecord {
            id: Uuid::new_v4(),
            title,
            description: draft.description.clone(),
            subject: draft.subject.clone(),
            status: TopicStatus::Active,
            version: 0,
            owner_id: self.session_user,
            topic_collaborators: Vec::new(),
            show_avatars: draft.show_avatars,
            is_collaborative: draft.is_collaborative,
            reference_info: ReferenceInfo::default(),
            template_id,
            created_at: None,
            updated_at: self.now(),
        }
    }

    fn insert_topic_record(&mut self, record: TopicRecord, command: &'static str) -> CoreResult<Topic> {
        let confirmed = self
            .remote
            .insert_topic(record)
            .map_err(|err| transport(command, EntityKind::Topic, err))?;
        self.directory.ensure_loaded(self.users.as_ref());
        let topic = topic_from_record(confirmed, Vec::new(), &self.directory);
        self.stores.topics.push_front(topic.clone());
        info!(
            "event={command} module=service status=ok version={}",
            topic.version
        );
        Ok(topic)
    }

    /// Looks up a topic and checks the caller's version against it.
    fn topic_for_edit(&self, topic_id: TopicId, expected_version: u64) -> CoreResult<&Topic> {
        let topic = self
            .stores
            .topics
            .get(topic_id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Topic, topic_id))?;
        ensure_version(EntityKind::Topic, topic_id, expected_version, topic.version)?;
        Ok(topic)
    }

    fn commit_reference_info(
        &mut self,
        topic_id: TopicId,
        expected_version: u64,
        info: ReferenceInfo,
        command: &'static str,
    ) -> CoreResult<Topic> {
        let patch = TopicPatch {
            reference_info: Some(info),
            ..TopicPatch::default()
        };
        self.commit_topic(topic_id, expected_version, &patch, command)
    }

    /// Version-gated write of one topic patch.
    pub(super) fn commit_topic(
        &mut self,
        topic_id: TopicId,
        expected_version: u64,
        patch: &TopicPatch,
        command: &'static str,
    ) -> CoreResult<Topic> {
        let goal_ids = self.topic_for_edit(topic_id, expected_version)?.goal_ids.clone();
        let outcome = self.remote.update_topic(topic_id, expected_version, patch);
        let record = settle(EntityKind::Topic, topic_id, expected_version, command, outcome)?;
        check_confirmed_version(EntityKind::Topic, expected_version, record.version);

        let topic = topic_from_record(record, goal_ids, &self.directory);
        self.stores.topics.upsert(topic.clone());
        info!(
            "event={command} module=service status=ok kind=topic version={}",
            topic.version
        );
        Ok(topic)
    }
}

fn collaborator_records(topic: &Topic) -> Vec<CollaboratorRecord> {
    topic
        .collaborators
        .iter()
        .map(CollaboratorRecord::from)
        .collect()
}

fn reference_fields(title: &str, url: &str) -> Result<(String, String), ValidationError> {
    let title = require_title("reference title", title)?;
    let url = url.trim();
    if url.is_empty() {
        return Err(ValidationError::new("url", "must not be blank"));
    }
    Ok((title, url.to_string()))
}
