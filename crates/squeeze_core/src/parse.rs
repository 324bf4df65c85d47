//! Import parser. Text-based and tolerant: an unrecognized import statement
//! yields no record rather than a hard error — it fails by omission only.
//!
//! This deliberately does not parse a full program (no AST, no swc): a
//! regexp-equivalent scan that degrades gracefully on partially broken
//! trees is wanted here, so a handful of anchored patterns plus a small
//! comment-stripping pre-pass stand in for a parser.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

/// One named binding inside a `{ ... }` clause. `local` equals `imported`
/// unless the source used an `as` alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedImportClause {
    pub imported: String,
    pub local: String,
}

/// One import/export/require/dynamic-import statement found in a source file.
///
/// Invariant: `side_effect_only` implies every other field is empty.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ImportRecord {
    pub specifier: String,
    pub default_import: Option<String>,
    pub namespace_import: Option<String>,
    pub named_imports: Vec<NamedImportClause>,
    pub side_effect_only: bool,
}

fn import_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?x)
            import\s+(?P<import_clause>[^;'"]+?)\s*from\s*['"](?P<import_clause_spec>[^'"]*)['"]
          | import\s*['"](?P<import_bare_spec>[^'"]*)['"]
          | export\s+(?P<export_clause>[^;'"]+?)\s*from\s*['"](?P<export_spec>[^'"]*)['"]
          | import\s*\(\s*['"](?P<dyn_import_spec>[^'"]*)['"]\s*\)
          | require\s*\(\s*['"](?P<require_spec>[^'"]*)['"]\s*\)
            "#,
        )
        .expect("import scanner regex is statically valid")
    })
}

/// Replace line comments, block comments, and the contents of string/template
/// literals' escape sequences are preserved but the comment bodies become
/// whitespace, so specifiers written inside comments never match.
pub(crate) fn strip_comments(source: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Normal,
        LineComment,
        BlockComment,
        SingleQuote,
        DoubleQuote,
        Template,
    }

    let chars: Vec<char> = source.chars().collect();
    let mut out = String::with_capacity(source.len());
    let mut state = State::Normal;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        match state {
            State::Normal => match (c, next) {
                ('/', Some('/')) => {
                    state = State::LineComment;
                    out.push(' ');
                    out.push(' ');
                    i += 2;
                }
                ('/', Some('*')) => {
                    state = State::BlockComment;
                    out.push(' ');
                    out.push(' ');
                    i += 2;
                }
                ('\'', _) => {
                    state = State::SingleQuote;
                    out.push(c);
                    i += 1;
                }
                ('"', _) => {
                    state = State::DoubleQuote;
                    out.push(c);
                    i += 1;
                }
                ('`', _) => {
                    state = State::Template;
                    out.push(c);
                    i += 1;
                }
                _ => {
                    out.push(c);
                    i += 1;
                }
            },
            State::LineComment => {
                if c == '\n' {
                    state = State::Normal;
                    out.push('\n');
                } else {
                    out.push(' ');
                }
                i += 1;
            }
            State::BlockComment => {
                if c == '*' && next == Some('/') {
                    state = State::Normal;
                    out.push(' ');
                    out.push(' ');
                    i += 2;
                } else {
                    out.push(if c == '\n' { '\n' } else { ' ' });
                    i += 1;
                }
            }
            State::SingleQuote | State::DoubleQuote | State::Template => {
                let closing = match state {
                    State::SingleQuote => '\'',
                    State::DoubleQuote => '"',
                    State::Template => '`',
                    State::Normal | State::LineComment | State::BlockComment => unreachable!(),
                };
                if c == '\\' {
                    out.push(c);
                    if let Some(escaped) = next {
                        out.push(escaped);
                        i += 2;
                        continue;
                    }
                    i += 1;
                } else if c == closing {
                    state = State::Normal;
                    out.push(c);
                    i += 1;
                } else {
                    out.push(c);
                    i += 1;
                }
            }
        }
    }
    out
}

fn parse_named_list(body: &str) -> Vec<NamedImportClause> {
    body.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .filter_map(|item| {
            let mut words = item.split_whitespace();
            let imported = words.next()?.to_string();
            let local = match (words.next(), words.next()) {
                (Some("as"), Some(alias)) => alias.to_string(),
                _ => imported.clone(),
            };
            Some(NamedImportClause { imported, local })
        })
        .collect()
}

type ClauseParts = (Option<String>, Option<String>, Vec<NamedImportClause>);

/// Parses the import-clause grammar:
/// ```text
/// clause    := "{" namedList "}"
///            | "*" "as" Ident
///            | Ident ( "," ( "{" namedList "}" | "*" "as" Ident ) )?
/// namedList := (Ident ("as" Ident)?) ( "," Ident ("as" Ident)? )*
/// ```
fn parse_clause(clause: &str) -> ClauseParts {
    let clause = clause.trim();
    if clause.is_empty() {
        return (None, None, Vec::new());
    }
    if let Some(inner) = clause.strip_prefix('{').and_then(|c| c.strip_suffix('}')) {
        return (None, None, parse_named_list(inner));
    }
    if let Some(rest) = clause.strip_prefix('*') {
        let namespace = parse_namespace_as(rest);
        return (None, namespace, Vec::new());
    }
    match clause.split_once(',') {
        Some((default_part, rest)) => {
            let default_ident = default_part.trim().to_string();
            let rest = rest.trim();
            if let Some(inner) = rest.strip_prefix('{').and_then(|c| c.strip_suffix('}')) {
                (Some(default_ident), None, parse_named_list(inner))
            } else if let Some(star_rest) = rest.strip_prefix('*') {
                (Some(default_ident), parse_namespace_as(star_rest), Vec::new())
            } else {
                (Some(default_ident), None, Vec::new())
            }
        }
        None => (Some(clause.to_string()), None, Vec::new()),
    }
}

fn parse_namespace_as(rest: &str) -> Option<String> {
    let rest = rest.trim();
    rest.strip_prefix("as")
        .map(str::trim)
        .map(|ident| ident.to_string())
}

/// Scans `source` for the four import-shaped statement families and returns
/// records in the order they appear in the text.
///
/// A bare `import "<spec>";` is recorded only if no `from`-clause record
/// (`import ... from` or `export ... from`) for the same specifier has
/// already been seen *earlier* in the file — matching spec §4.2's literal
/// "recorded only if no `from` record already matches the specifier". The
/// check is positional, not file-wide: a bare import preceding a later
/// `from` import for the same specifier is kept, since at the point it's
/// scanned no `from` record has matched yet.
pub fn parse_imports(source: &str) -> Vec<ImportRecord> {
    let masked = strip_comments(source);
    let mut records = Vec::new();
    let mut from_form_specs: HashSet<String> = HashSet::new();

    for caps in import_regex().captures_iter(&masked) {
        if let Some(spec) = caps.name("import_clause_spec") {
            let clause = caps.name("import_clause").map(|m| m.as_str()).unwrap_or("");
            let (default_import, namespace_import, named_imports) = parse_clause(clause);
            let specifier = spec.as_str().to_string();
            from_form_specs.insert(specifier.clone());
            records.push(ImportRecord {
                specifier,
                default_import,
                namespace_import,
                named_imports,
                side_effect_only: false,
            });
        } else if let Some(spec) = caps.name("import_bare_spec") {
            let specifier = spec.as_str().to_string();
            if from_form_specs.contains(&specifier) {
                continue;
            }
            records.push(ImportRecord {
                specifier,
                side_effect_only: true,
                ..Default::default()
            });
        } else if let Some(spec) = caps.name("export_spec") {
            let clause = caps.name("export_clause").map(|m| m.as_str()).unwrap_or("");
            let (default_import, namespace_import, named_imports) = parse_clause(clause);
            let specifier = spec.as_str().to_string();
            from_form_specs.insert(specifier.clone());
            records.push(ImportRecord {
                specifier,
                default_import,
                namespace_import,
                named_imports,
                side_effect_only: false,
            });
        } else if let Some(spec) = caps.name("dyn_import_spec") {
            records.push(ImportRecord {
                specifier: spec.as_str().to_string(),
                side_effect_only: true,
                ..Default::default()
            });
        } else if let Some(spec) = caps.name("require_spec") {
            records.push(ImportRecord {
                specifier: spec.as_str().to_string(),
                side_effect_only: true,
                ..Default::default()
            });
        }
    }

    records
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_import() {
        let records = parse_imports(r#"import foo from './bar';"#);
        assert_eq!(
            records,
            vec![ImportRecord {
                specifier: "./bar".into(),
                default_import: Some("foo".into()),
                ..Default::default()
            }]
        );
    }

    #[test]
    fn named_imports_with_alias() {
        let records = parse_imports(r#"import { a, b as c } from "./bar";"#);
        assert_eq!(records.len(), 1);
        assert_eq!(
            records[0].named_imports,
            vec![
                NamedImportClause {
                    imported: "a".into(),
                    local: "a".into()
                },
                NamedImportClause {
                    imported: "b".into(),
                    local: "c".into()
                },
            ]
        );
    }

    #[test]
    fn namespace_import() {
        let records = parse_imports(r#"import * as ns from './bar';"#);
        assert_eq!(records[0].namespace_import, Some("ns".into()));
    }

    #[test]
    fn default_plus_named() {
        let records = parse_imports(r#"import D, { a, b as c } from "./bar";"#);
        assert_eq!(records[0].default_import, Some("D".into()));
        assert_eq!(records[0].named_imports.len(), 2);
    }

    #[test]
    fn default_plus_namespace() {
        let records = parse_imports(r#"import D, * as ns from "./bar";"#);
        assert_eq!(records[0].default_import, Some("D".into()));
        assert_eq!(records[0].namespace_import, Some("ns".into()));
    }

    #[test]
    fn side_effect_only() {
        let records = parse_imports(r#"import "./init.mjs";"#);
        assert_eq!(
            records,
            vec![ImportRecord {
                specifier: "./init.mjs".into(),
                side_effect_only: true,
                ..Default::default()
            }]
        );
    }

    #[test]
    fn side_effect_suppressed_when_from_form_present() {
        let records =
            parse_imports(r#"import x from "./a"; import "./a"; import "./b";"#);
        let specs: Vec<&str> = records.iter().map(|r| r.specifier.as_str()).collect();
        assert_eq!(specs, vec!["./a", "./b"]);
    }

    #[test]
    fn side_effect_kept_when_it_precedes_the_from_form() {
        // the bare import is scanned before any `from` record for the same
        // specifier has been seen, so it is kept rather than suppressed —
        // suppression only looks backward, never forward.
        let records = parse_imports(r#"import "./shared.mjs"; import { x } from "./shared.mjs";"#);
        assert_eq!(records.len(), 2);
        assert!(records[0].side_effect_only);
        assert_eq!(records[0].specifier, "./shared.mjs");
        assert!(!records[1].side_effect_only);
        assert_eq!(records[1].named_imports[0].imported, "x");
    }

    #[test]
    fn export_named_from() {
        let records = parse_imports(r#"export { default as a, foo as bar } from './foo'"#);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].specifier, "./foo");
        assert_eq!(
            records[0].named_imports,
            vec![
                NamedImportClause {
                    imported: "default".into(),
                    local: "a".into()
                },
                NamedImportClause {
                    imported: "foo".into(),
                    local: "bar".into()
                },
            ]
        );
    }

    #[test]
    fn require_call() {
        let records = parse_imports(r#"const x = require('hello-world');"#);
        assert_eq!(records[0].specifier, "hello-world");
        assert!(records[0].side_effect_only);
    }

    #[test]
    fn dynamic_import_with_literal() {
        let records = parse_imports(r#"import('foo')"#);
        assert_eq!(records[0].specifier, "foo");
    }

    #[test]
    fn dynamic_import_nested_computed_outer_is_ignored() {
        // the outer import() has a computed (non-literal) argument and is
        // never recorded; the nested literal import('import_subrequire') is.
        let records = parse_imports(
            r#"import(import('import_subrequire').default + '/parent')"#,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].specifier, "import_subrequire");
    }

    #[test]
    fn ignores_commented_out_imports() {
        let records = parse_imports(
            r#"
            // import foo from './a';
            /* import bar from './b'; */
            import baz from './c';
            "#,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].specifier, "./c");
    }

    #[test]
    fn multiline_from_clause() {
        let records = parse_imports(
            r#"
            import {
                a,
                b
            } from './multi';
            "#,
        );
        assert_eq!(records[0].specifier, "./multi");
        assert_eq!(records[0].named_imports.len(), 2);
    }

    #[test]
    fn unrecognized_statement_yields_no_record() {
        let records = parse_imports(r#"const x = 5; function foo() {}"#);
        assert!(records.is_empty());
    }
}
