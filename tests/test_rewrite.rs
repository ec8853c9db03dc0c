// Copyright (C) Brian G. Milnes 2025

//! Tests for the per-file rewrite engine

use anyhow::Result;
use std::path::Path;

mod common;
use common::{field_rule, key_rule, table};

use rekey::{builtin_mapping, rewrite, ChangeSet, MappingConfig, MappingTable, RelationRemap, RenameRule, Role, RoleSet};

fn run(table: &MappingTable, source: &str) -> Result<String> {
    Ok(rewrite(Path::new("lib/service.ts"), source, table)?.new_text)
}

#[test]
fn test_create_payload_keys_renamed() -> Result<()> {
    let table = table(vec![
        field_rule("instanceId", "instance_id"),
        field_rule("riskLevel", "risk_level"),
    ]);
    let source = "await prisma.campaigns.create({ data: { instanceId: x, riskLevel: 'low' } });";
    let result = rewrite(Path::new("lib/service.ts"), source, &table)?;

    assert_eq!(
        result.new_text,
        "await prisma.campaigns.create({ data: { instance_id: x, risk_level: 'low' } });"
    );
    assert_eq!(result.change_set.edits.len(), 2);
    assert!(result.conflicts.is_empty());
    Ok(())
}

#[test]
fn test_member_access_renamed() -> Result<()> {
    let table = table(vec![field_rule("riskLevel", "risk_level")]);
    let source = "if (campaign.riskLevel === 'high') { warn(campaign?.riskLevel); }";
    assert_eq!(
        run(&table, source)?,
        "if (campaign.risk_level === 'high') { warn(campaign?.risk_level); }"
    );
    Ok(())
}

#[test]
fn test_local_variable_left_alone() -> Result<()> {
    let table = table(vec![field_rule("phoneNumber", "phone_number")]);
    let source = "function normalize(phoneNumber: string) {\n  const digits = phoneNumber.replace(/\\D/g, '');\n  return { phone: phoneNumber, digits };\n}\n";
    let result = rewrite(Path::new("lib/phone.ts"), source, &table)?;
    assert_eq!(result.new_text, source);
    assert!(!result.changed());
    Ok(())
}

#[test]
fn test_comments_and_plain_strings_untouched() -> Result<()> {
    let table = table(vec![field_rule("riskLevel", "risk_level")]);
    let source = "// riskLevel: keep this\nconst label = 'riskLevel';\nconst v = row.riskLevel;\n";
    assert_eq!(
        run(&table, source)?,
        "// riskLevel: keep this\nconst label = 'riskLevel';\nconst v = row.risk_level;\n"
    );
    Ok(())
}

#[test]
fn test_tied_rules_produce_one_conflict() -> Result<()> {
    let table = table(vec![
        field_rule("riskLevel", "risk_level"),
        field_rule("riskLevel", "risk").file_marker("prisma"),
    ]);
    let source = "const db = prisma;\nconst r = db.riskLevel;\n";
    let result = rewrite(Path::new("lib/risk.ts"), source, &table)?;

    assert_eq!(result.new_text, source);
    assert_eq!(result.conflicts.len(), 1);
    let conflict = &result.conflicts[0];
    assert_eq!(conflict.identifier, "riskLevel");
    assert_eq!(conflict.line, 2);
    assert_eq!(conflict.role, Role::MemberAccess);
    assert_eq!(conflict.candidates, vec!["risk".to_string(), "risk_level".to_string()]);
    assert!(conflict.to_string().contains("lib/risk.ts:2"));
    Ok(())
}

#[test]
fn test_higher_priority_rule_wins() -> Result<()> {
    let table = table(vec![
        field_rule("riskLevel", "risk_level"),
        field_rule("riskLevel", "risk").file_marker("prisma").priority(5),
    ]);
    let source = "const db = prisma;\nconst r = db.riskLevel;\n";
    assert_eq!(run(&table, source)?, "const db = prisma;\nconst r = db.risk;\n");
    Ok(())
}

#[test]
fn test_receiver_guard() -> Result<()> {
    let table = table(vec![
        field_rule("riskLevel", "risk_level"),
        field_rule("riskLevel", "campaign_risk").receiver("campaign").priority(1),
    ]);
    let source = "a = campaign.riskLevel;\nb = contact.riskLevel;\n";
    assert_eq!(
        run(&table, source)?,
        "a = campaign.campaign_risk;\nb = contact.risk_level;\n"
    );
    Ok(())
}

#[test]
fn test_shorthand_expanded_only_when_safe() -> Result<()> {
    let source = "return NextResponse.json({ totalContacts, page });";

    let unsafe_table = table(vec![key_rule("totalContacts", "total_contacts")]);
    assert_eq!(run(&unsafe_table, source)?, source);

    let safe_table = table(vec![key_rule("totalContacts", "total_contacts").shorthand_safe()]);
    assert_eq!(
        run(&safe_table, source)?,
        "return NextResponse.json({ totalContacts: total_contacts, page });"
    );
    Ok(())
}

#[test]
fn test_relation_renamed_only_in_structural_blocks() -> Result<()> {
    let table = MappingTable::new(MappingConfig {
        relations: vec![RelationRemap::new("instance", "whatsapp_instances")],
        ..MappingConfig::default()
    })?;
    let source = "prisma.campaigns.findMany({\n  include: { instance: true },\n  where: { instance: 'x' },\n});\n";
    assert_eq!(
        run(&table, source)?,
        "prisma.campaigns.findMany({\n  include: { whatsapp_instances: true },\n  where: { instance: 'x' },\n});\n"
    );

    let plain = "const payload = { instance: current };\n";
    assert_eq!(run(&table, plain)?, plain);
    Ok(())
}

#[test]
fn test_relation_rename_scoped_by_path() -> Result<()> {
    let table = MappingTable::new(builtin_mapping())?;
    let source = "prisma.x.findMany({ include: { _count: { select: { messages: true } } } });";

    let conversations = rewrite(Path::new("app/api/conversations/route.ts"), source, &table)?;
    assert!(conversations.new_text.contains("whatsapp_conversation_messages: true"));

    let campaigns = rewrite(Path::new("app/api/whatsapp/campaigns/[id]/route.ts"), source, &table)?;
    assert!(campaigns.new_text.contains("campaign_messages: true"));

    let elsewhere = rewrite(Path::new("lib/stats.ts"), source, &table)?;
    assert_eq!(elsewhere.new_text, source);
    Ok(())
}

#[test]
fn test_template_segment_needs_scope_and_prefix() -> Result<()> {
    let rule = RenameRule::new("riskLevel", "risk_level", RoleSet::of(&[Role::MemberAccess, Role::TemplateSegment]));
    let table = MappingTable::new(MappingConfig {
        fields: vec![rule],
        template_prefixes: vec!["campaign:".to_string()],
        ..MappingConfig::default()
    })?;
    let source = "const key = `campaign:${id}:riskLevel`;\nconst label = 'riskLevel';\n";
    assert_eq!(
        run(&table, source)?,
        "const key = `campaign:${id}:risk_level`;\nconst label = 'riskLevel';\n"
    );
    Ok(())
}

#[test]
fn test_create_site_gets_id() -> Result<()> {
    let table = MappingTable::new(MappingConfig {
        create_ids: true,
        ..MappingConfig::default()
    })?;
    let source = "await prisma.contacts.create({\n  data: {\n    name,\n  },\n});\n";
    let result = rewrite(Path::new("lib/contacts.ts"), source, &table)?;
    assert_eq!(
        result.new_text,
        "await prisma.contacts.create({\n  data: {\n    id: uuidv4(),\n    name,\n  },\n});\n"
    );
    assert!(result.imports_needed);

    let again = rewrite(Path::new("lib/contacts.ts"), &result.new_text, &table)?;
    assert!(!again.changed());
    assert!(!again.imports_needed);
    Ok(())
}

#[test]
fn test_inline_create_site_and_existing_ids() -> Result<()> {
    let table = MappingTable::new(MappingConfig {
        create_ids: true,
        ..MappingConfig::default()
    })?;
    assert_eq!(
        run(&table, "db.tag.create({ data: { label: 'x' } });")?,
        "db.tag.create({ data: { id: uuidv4(), label: 'x' } });"
    );

    let with_id = "db.tag.create({ data: { id: makeId(), label: 'x' } });";
    assert_eq!(run(&table, with_id)?, with_id);

    let with_spread = "db.tag.create({ data: { ...input } });";
    assert_eq!(run(&table, with_spread)?, with_spread);
    Ok(())
}

#[test]
fn test_missing_id_reported_without_insertion() -> Result<()> {
    let table = table(Vec::new());
    let source = "db.tag.create({ data: { label: 'x' } });";
    let result = rewrite(Path::new("lib/tags.ts"), source, &table)?;
    assert_eq!(result.new_text, source);
    assert!(result.imports_needed);
    Ok(())
}

#[test]
fn test_rewrite_is_idempotent() -> Result<()> {
    let table = MappingTable::new(builtin_mapping())?;
    let source = "import { prisma } from '@/lib/prisma';\n\nexport async function load(id: string) {\n  const campaign = await prisma.campaigns.findUnique({\n    where: { id },\n    include: { instance: true, template: true },\n  });\n  return { instanceId: campaign.instanceId, sent: campaign.sentCount };\n}\n";
    let once = run(&table, source)?;
    assert_ne!(once, source);
    assert!(once.contains("include: { whatsapp_instances: true, message_templates: true }"));
    assert!(once.contains("instance_id: campaign.instance_id"));
    assert_eq!(run(&table, &once)?, once);
    Ok(())
}

#[test]
fn test_change_set_rejects_overlap() {
    let mut changes = ChangeSet::new(Path::new("a.ts"));
    changes.push(0, 5, "x".to_string());
    changes.push(3, 2, "y".to_string());
    assert!(changes.apply("abcdefgh").is_err());
}

#[test]
fn test_change_set_applies_right_to_left() -> Result<()> {
    let mut changes = ChangeSet::new(Path::new("a.ts"));
    changes.push(4, 1, "EEE".to_string());
    changes.push(0, 1, "AA".to_string());
    changes.push(2, 0, "+".to_string());
    assert_eq!(changes.apply("abcdef")?, "AAb+cdEEEf");
    Ok(())
}

#[test]
fn test_shorthand_rule_leaves_jsx_and_blocks_alone() -> Result<()> {
    let table = table(vec![key_rule("phoneNumber", "phone_number").shorthand_safe()]);
    let source = "export function Phone({ ok }: Props) {\n  if (ok) { phoneNumber }\n  return <span title={phoneNumber}>{phoneNumber}</span>;\n}\n";
    let result = rewrite(Path::new("components/Phone.tsx"), source, &table)?;
    assert_eq!(result.new_text, source);

    let literal = "const row = { phoneNumber };\n";
    assert_eq!(run(&table, literal)?, "const row = { phoneNumber: phone_number };\n");
    Ok(())
}
