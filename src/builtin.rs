// Copyright (C) Brian G. Milnes 2025

//! Built-in mapping for the WhatsApp CRM schema migration
//!
//! Fields moved from camelCase to snake_case; several relations were renamed
//! after their target tables. Used when `rekey fix` gets no `--mapping` file.

pub mod builtin {
    use crate::mapping::mapping::{Helper, MappingConfig, RelationRemap, RenameRule, RoleSet};

    /// camelCase field → snake_case column, rewritten as keys and member accesses
    pub const FIELD_RENAMES: &[(&str, &str)] = &[
        ("userId", "user_id"),
        ("instanceId", "instance_id"),
        ("templateId", "template_id"),
        ("campaignId", "campaign_id"),
        ("contactId", "contact_id"),
        ("companyId", "company_id"),
        ("conversationId", "conversation_id"),
        ("messageId", "message_id"),
        ("contactPhone", "contact_phone"),
        ("contactName", "contact_name"),
        ("phoneNumber", "phone_number"),
        ("assignedTo", "assigned_to"),
        ("tabulatedAt", "tabulated_at"),
        ("closedAt", "closed_at"),
        ("lastMessageAt", "last_message_at"),
        ("fromMe", "from_me"),
        ("messageType", "message_type"),
        ("messageContent", "message_content"),
        ("mediaType", "media_type"),
        ("mediaUrl", "media_url"),
        ("mediaName", "media_name"),
        ("totalContacts", "total_contacts"),
        ("sentCount", "sent_count"),
        ("failedCount", "failed_count"),
        ("intervalMin", "interval_min"),
        ("intervalMax", "interval_max"),
        ("errorMessage", "error_message"),
        ("responseTime", "response_time"),
        ("riskLevel", "risk_level"),
        ("scheduledAt", "scheduled_at"),
        ("startedAt", "started_at"),
        ("completedAt", "completed_at"),
        ("createdAt", "created_at"),
        ("updatedAt", "updated_at"),
        ("proxyServer", "proxy_servers"),
        ("campaignMessages", "campaign_messages"),
        ("phoneNumber_companyId", "phone_number_company_id"),
    ];

    /// Relation name → table-named relation, inside include/select blocks only
    pub const RELATION_RENAMES: &[(&str, &str)] = &[
        ("agent", "users"),
        ("instance", "whatsapp_instances"),
        ("template", "message_templates"),
        ("contact", "contacts"),
        ("campaign", "campaigns"),
    ];

    /// `messages` means different relations depending on the owning model
    pub const SCOPED_RELATION_RENAMES: &[(&str, &str, &str)] = &[
        ("messages", "campaign_messages", "app/api/whatsapp/campaigns"),
        ("messages", "campaign_messages", "lib/whatsapp/campaign"),
        ("messages", "whatsapp_conversation_messages", "app/api/conversations"),
    ];

    pub fn builtin_mapping() -> MappingConfig {
        let fields = FIELD_RENAMES
            .iter()
            .map(|(from, to)| RenameRule::new(from, to, RoleSet::FIELD))
            .collect();

        let mut relations: Vec<RelationRemap> = RELATION_RENAMES
            .iter()
            .map(|(from, to)| RelationRemap::new(from, to))
            .collect();
        relations.extend(
            SCOPED_RELATION_RENAMES
                .iter()
                .map(|(from, to, prefix)| RelationRemap::new(from, to).path_prefix(prefix)),
        );

        MappingConfig {
            fields,
            relations,
            helper: Helper::default(),
            create_ids: true,
            ..MappingConfig::default()
        }
    }
}
