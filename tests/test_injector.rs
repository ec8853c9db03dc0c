// Copyright (C) Brian G. Milnes 2025

//! Tests for helper import injection

use rekey::{inject, Helper};

const DECLARATION: &str = "import { v4 as uuidv4 } from 'uuid';";

#[test]
fn test_inserted_after_last_import() {
    let source = "import { prisma } from '@/lib/prisma';\nimport x from 'y';\n\nconst a = 1;\n";
    let injection = inject(source, true, &Helper::default());
    assert!(injection.injected);
    assert_eq!(
        injection.text,
        format!("import {{ prisma }} from '@/lib/prisma';\nimport x from 'y';\n{DECLARATION}\n\nconst a = 1;\n")
    );
}

#[test]
fn test_injecting_twice_adds_one_declaration() {
    let source = "import x from 'y';\nconst a = 1;\n";
    let once = inject(source, true, &Helper::default());
    let twice = inject(&once.text, true, &Helper::default());
    assert!(!twice.injected);
    assert_eq!(twice.text, once.text);
    assert_eq!(twice.text.matches(DECLARATION).count(), 1);
}

#[test]
fn test_not_needed_leaves_text_alone() {
    let source = "const a = 1;\n";
    let injection = inject(source, false, &Helper::default());
    assert!(!injection.injected);
    assert_eq!(injection.text, source);
}

#[test]
fn test_file_without_imports_starts_with_declaration() {
    let injection = inject("const a = 1;\n", true, &Helper::default());
    assert_eq!(injection.text, format!("{DECLARATION}\nconst a = 1;\n"));
}

#[test]
fn test_leading_directive_stays_first() {
    let injection = inject("'use client';\nconst a = 1;\n", true, &Helper::default());
    assert_eq!(injection.text, format!("'use client';\n{DECLARATION}\nconst a = 1;\n"));
}

#[test]
fn test_multi_line_import_block() {
    let source = "import {\n  a,\n  b,\n} from './x';\nconst c = 1;\n";
    let injection = inject(source, true, &Helper::default());
    assert_eq!(
        injection.text,
        format!("import {{\n  a,\n  b,\n}} from './x';\n{DECLARATION}\nconst c = 1;\n")
    );
}

#[test]
fn test_last_import_without_newline() {
    let injection = inject("import a from 'a';", true, &Helper::default());
    assert_eq!(injection.text, format!("import a from 'a';\n{DECLARATION}\n"));
}

#[test]
fn test_require_declaration_counts() {
    let source = "const { v4: uuidv4 } = require('uuid');\nconst id = uuidv4();\n";
    let injection = inject(source, true, &Helper::default());
    assert!(!injection.injected);
    assert_eq!(injection.text, source);
}

#[test]
fn test_reference_without_declaration_still_injects() {
    let source = "import x from 'y';\nconst id = uuidv4();\n";
    let injection = inject(source, true, &Helper::default());
    assert!(injection.injected);
    assert!(injection.text.contains(DECLARATION));
}

#[test]
fn test_nested_import_is_not_top_level() {
    let source = "import a from 'a';\nasync function load() {\n  const m = await import('./m');\n}\n";
    let injection = inject(source, true, &Helper::default());
    assert_eq!(
        injection.text,
        format!("import a from 'a';\n{DECLARATION}\nasync function load() {{\n  const m = await import('./m');\n}}\n")
    );
}

#[test]
fn test_custom_helper() {
    let helper = Helper {
        name: "cuid".to_string(),
        declaration: "import cuid from 'cuid';".to_string(),
    };
    let injection = inject("import a from 'a';\n", true, &helper);
    assert_eq!(injection.text, "import a from 'a';\nimport cuid from 'cuid';\n");
    assert!(!inject(&injection.text, true, &helper).injected);
}

#[test]
fn test_local_helper_definition_counts() {
    for source in [
        "import x from 'y';\nconst uuidv4 = () => crypto.randomUUID();\nconst id = uuidv4();\n",
        "function uuidv4() {\n  return crypto.randomUUID();\n}\nconst id = uuidv4();\n",
        "export const uuidv4 = () => crypto.randomUUID();\n",
    ] {
        let injection = inject(source, true, &Helper::default());
        assert!(!injection.injected, "{source}");
        assert_eq!(injection.text, source);
    }
}

#[test]
fn test_nested_helper_definition_still_injects() {
    let source = "import x from 'y';\nfunction load() {\n  const uuidv4 = makeId;\n  return uuidv4();\n}\nconst id = uuidv4();\n";
    let injection = inject(source, true, &Helper::default());
    assert!(injection.injected);
    assert_eq!(injection.text.matches(DECLARATION).count(), 1);
}
