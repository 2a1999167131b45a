//! Language resolution from file names and content.
//!
//! Resolution happens in two steps. [`detect_language`] works from the file
//! name alone and runs before the file is read. Once the content is loaded,
//! [`resolve_language`] settles files whose name was ambiguous: extension-less
//! scripts are looked up by their `#!` line and extensions shared by several
//! languages are decided by keyword counts.

use log::{trace, warn};

use crate::language::feature::LanguageDatabase;
use crate::options::ScanConfig;

/// Placeholder language for files that need their `#!` line inspected.
pub const SHEBANG: &str = "#!";

/// Only this many leading bytes are searched for a `#!` line.
const SHEBANG_CUTOFF: usize = 200;

/// Only this many leading bytes are searched for keywords.
const KEYWORD_CUTOFF: usize = 20_000;

/// Only this many leading bytes are searched for remap markers.
const REMAP_CUTOFF: usize = 1000;

/// Matches needed before a keyword language beats the keyword-less one.
const KEYWORD_THRESHOLD: usize = 3;

/// Outcome of name-based detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Candidate languages, `[SHEBANG]` for possible scripts, empty if unknown
    pub languages: Vec<String>,
    /// Extension used for the lookup, compared against allow/deny lists
    pub extension: String,
}

/// Lower-cased extension of `name`, keeping one extra level for names like
/// `index.d.ts` (`d.ts`). Names without a dot, or with only a leading dot,
/// are returned whole.
pub fn get_extension(name: &str) -> String {
    let name = name.to_lowercase();

    let Some(last) = name.rfind('.') else {
        return name;
    };
    if last == 0 {
        return name;
    }

    let stem = &name[..last];
    match stem.rfind('.') {
        Some(sub) => name[sub + 1..].to_string(),
        None => name[last + 1..].to_string(),
    }
}

/// Guess candidate languages for a file from its name.
pub fn detect_language(db: &LanguageDatabase, name: &str) -> Detection {
    let lower = name.to_lowercase();

    if let Some(language) = db.language_for_filename(&lower) {
        return Detection {
            languages: vec![language.to_string()],
            extension: name.to_string(),
        };
    }

    let dots = name.matches('.').count();
    if dots == 0 || (name.starts_with('.') && dots == 1) {
        trace!("possible #! file: {name}");
        return Detection {
            languages: vec![SHEBANG.to_string()],
            extension: name.to_string(),
        };
    }

    if let Some(languages) = db.languages_for_extension(&lower) {
        return Detection {
            languages: languages.to_vec(),
            extension: String::new(),
        };
    }

    let extension = get_extension(name);
    if let Some(languages) = db.languages_for_extension(&extension) {
        return Detection {
            languages: languages.to_vec(),
            extension,
        };
    }

    // d.ts with no entry of its own falls back to ts
    let extension = get_extension(&extension);
    let languages = db
        .languages_for_extension(&extension)
        .map(<[String]>::to_vec)
        .unwrap_or_default();
    Detection {
        languages,
        extension,
    }
}

/// Pull the interpreter out of a `#!` line.
///
/// The interpreter is the last path component of the first word, or the
/// following word when that component is `env`. A line without any `/`
/// names no interpreter.
pub fn scan_for_shebang(line: &str) -> Option<&str> {
    let slash = line.find('/')?;
    let mut words = line[slash..].split_whitespace();

    let first = words.next()?;
    let command = first.rsplit('/').next().unwrap_or(first);

    if command == "env" {
        words.next()
    } else if command.is_empty() {
        None
    } else {
        Some(command)
    }
}

/// Map the `#!` line at the top of `content` to a known language.
pub fn detect_shebang<'a>(db: &'a LanguageDatabase, content: &[u8]) -> Option<&'a str> {
    let head = &content[..content.len().min(SHEBANG_CUTOFF)];
    if !head.starts_with(b"#!") {
        return None;
    }

    let head = String::from_utf8_lossy(head);
    let line = head.lines().next().unwrap_or_default();
    let command = scan_for_shebang(line)?;
    db.language_for_interpreter(command)
}

/// Pick one language out of several candidates sharing an extension.
///
/// Each candidate scores one point per keyword found in the first 20 000
/// bytes. The highest score wins, ties broken by name. When a candidate has
/// no keywords at all it is the primary language, and another candidate
/// only wins over it with at least three matches.
pub fn determine_language(
    db: &LanguageDatabase,
    filename: &str,
    fallback: &str,
    possible: &[String],
    content: &[u8],
) -> String {
    match possible {
        [] => return fallback.to_string(),
        [only] => return only.clone(),
        _ => {}
    }

    let head = String::from_utf8_lossy(&content[..content.len().min(KEYWORD_CUTOFF)]);
    let mut primary = None;

    let mut scores: Vec<(&str, usize)> = possible
        .iter()
        .map(|name| {
            let keywords = db
                .feature(name)
                .map(|f| f.keywords.as_slice())
                .unwrap_or_default();
            if keywords.is_empty() {
                primary = Some(name.as_str());
            }
            let count = keywords.iter().filter(|k| head.contains(k.as_str())).count();
            (name.as_str(), count)
        })
        .collect();

    scores.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let (best, count) = scores[0];
    if let Some(primary) = primary {
        if count < KEYWORD_THRESHOLD {
            return primary.to_string();
        }
    }

    warn!("guessing language {best} for file {filename}");
    best.to_string()
}

/// Language of the last `(marker, language)` rule whose marker appears in
/// the first 1000 bytes of `content`.
pub fn remap_language<'a>(rules: &'a [(String, String)], content: &[u8]) -> Option<&'a str> {
    let head = &content[..content.len().min(REMAP_CUTOFF)];
    rules
        .iter()
        .rev()
        .find(|(marker, _)| {
            let marker = marker.as_bytes();
            !marker.is_empty() && head.windows(marker.len()).any(|window| window == marker)
        })
        .map(|(_, language)| language.as_str())
}

/// Settle the final language of a loaded file.
///
/// `remap_all` rules override whatever was detected. A possible script is
/// then tried against the `remap_unknown` rules before its `#!` line.
/// Returns `None` for scripts that neither names.
pub fn resolve_language(
    db: &LanguageDatabase,
    filename: &str,
    language: &str,
    possible: &[String],
    content: &[u8],
    config: &ScanConfig,
) -> Option<String> {
    let mut language = determine_language(db, filename, language, possible, content);

    if let Some(remapped) = remap_language(&config.remap_all, content) {
        warn!("hard remapping: {filename} to {remapped}");
        language = remapped.to_string();
    }
    if language != SHEBANG {
        return Some(language);
    }

    if let Some(remapped) = remap_language(&config.remap_unknown, content) {
        warn!("unknown remapping: {filename} to {remapped}");
        return Some(remapped.to_string());
    }
    detect_shebang(db, content).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> LanguageDatabase {
        LanguageDatabase::embedded(true).unwrap()
    }

    #[test]
    fn test_get_extension() {
        assert_eq!(get_extension("main.rs"), "rs");
        assert_eq!(get_extension("Main.JAVA"), "java");
        assert_eq!(get_extension("index.d.ts"), "d.ts");
        assert_eq!(get_extension("d.ts"), "ts");
        assert_eq!(get_extension("archive.tar.gz"), "tar.gz");
        assert_eq!(get_extension("Makefile"), "makefile");
        assert_eq!(get_extension(".bashrc"), ".bashrc");
    }

    #[test]
    fn detect_by_extension() {
        let d = detect_language(&db(), "Main.java");
        assert_eq!(d.languages, vec!["Java".to_string()]);
        assert_eq!(d.extension, "java");
    }

    #[test]
    fn detect_by_filename() {
        let d = detect_language(&db(), "Rakefile");
        assert_eq!(d.languages, vec!["Rakefile".to_string()]);
    }

    #[test]
    fn detect_typings_and_fallback() {
        let d = detect_language(&db(), "index.d.ts");
        assert_eq!(d.languages, vec!["TypeScript Typings".to_string()]);

        let d = detect_language(&db(), "component.spec.ts");
        assert_eq!(d.languages, vec!["TypeScript".to_string()]);
        assert_eq!(d.extension, "ts");
    }

    #[test]
    fn extensionless_files_are_possible_scripts() {
        assert_eq!(detect_language(&db(), "build").languages, vec![SHEBANG]);
        assert_eq!(detect_language(&db(), ".profile_x").languages, vec![SHEBANG]);
    }

    #[test]
    fn unknown_extension() {
        assert!(detect_language(&db(), "data.unknownext").languages.is_empty());
    }

    #[test]
    fn test_scan_for_shebang() {
        assert_eq!(scan_for_shebang("#!/bin/bash"), Some("bash"));
        assert_eq!(scan_for_shebang("#! /usr/bin/python3 -u"), Some("python3"));
        assert_eq!(scan_for_shebang("#!/usr/bin/env ruby"), Some("ruby"));
        assert_eq!(scan_for_shebang("#!/usr/bin/env  node  --x"), Some("node"));
        assert_eq!(scan_for_shebang("#!/usr/bin/env"), None);
        assert_eq!(scan_for_shebang("#!python"), None);
    }

    #[test]
    fn test_detect_shebang() {
        let db = db();
        assert_eq!(
            detect_shebang(&db, b"#!/usr/bin/env python3\nprint(1)\n"),
            Some("Python")
        );
        assert_eq!(detect_shebang(&db, b"#!/usr/bin/ruby\n"), Some("Ruby"));
        assert_eq!(detect_shebang(&db, b"print(1)\n"), None);
        assert_eq!(detect_shebang(&db, b"#!/opt/unheard-of\n"), None);
    }

    #[test]
    fn keyword_disambiguation_prefers_primary() {
        let db = db();
        let possible = vec!["CloudFormation (YAML)".to_string(), "YAML".to_string()];

        let plain = b"name: test\nitems:\n  - a\n";
        assert_eq!(
            determine_language(&db, "x.yml", "YAML", &possible, plain),
            "YAML"
        );

        let cfn = b"AWSTemplateFormatVersion: x\nResources:\n  A:\n    Type: AWS::S3::Bucket\n    Properties:\n";
        assert_eq!(
            determine_language(&db, "x.yml", "YAML", &possible, cfn),
            "CloudFormation (YAML)"
        );
    }

    #[test]
    fn keyword_disambiguation_without_primary() {
        let db = db();
        let possible = vec!["MATLAB".to_string(), "Objective C".to_string()];
        let objc = b"#import <Foundation/Foundation.h>\n@interface Foo\n@property int x;\n@end\n";
        assert_eq!(
            determine_language(&db, "foo.m", "MATLAB", &possible, objc),
            "Objective C"
        );
    }

    #[test]
    fn resolve_single_and_script() {
        let db = db();
        let config = ScanConfig::new();
        assert_eq!(
            resolve_language(&db, "a.rs", "Rust", &["Rust".to_string()], b"fn main() {}", &config),
            Some("Rust".to_string())
        );
        assert_eq!(
            resolve_language(
                &db,
                "run",
                SHEBANG,
                &[SHEBANG.to_string()],
                b"#!/bin/sh\necho\n",
                &config
            ),
            Some("Shell".to_string())
        );
        assert_eq!(
            resolve_language(&db, "README", SHEBANG, &[SHEBANG.to_string()], b"hello\n", &config),
            None
        );
    }

    #[test]
    fn test_remap_language() {
        let rules = vec![
            ("vim: ft=c".to_string(), "C".to_string()),
            ("-*- C++ -*-".to_string(), "C++".to_string()),
        ];
        assert_eq!(remap_language(&rules, b"// -*- C++ -*-\nint x;\n"), Some("C++"));
        assert_eq!(remap_language(&rules, b"/* vim: ft=c */ -*- C++ -*-"), Some("C++"));
        assert_eq!(remap_language(&rules, b"int x;\n"), None);

        let late = format!("{}-*- C++ -*-", " ".repeat(1000));
        assert_eq!(remap_language(&rules, late.as_bytes()), None);
    }

    #[test]
    fn remap_all_overrides_detection() {
        let db = db();
        let config = ScanConfig::new().remap_all("-*- C++ -*-", "C++");
        let possible = ["C Header".to_string()];
        assert_eq!(
            resolve_language(&db, "x.h", "C Header", &possible, b"// -*- C++ -*-\n", &config),
            Some("C++".to_string())
        );
        assert_eq!(
            resolve_language(&db, "x.h", "C Header", &possible, b"int x;\n", &config),
            Some("C Header".to_string())
        );
    }

    #[test]
    fn remap_unknown_only_applies_to_scripts() {
        let db = db();
        let config = ScanConfig::new().remap_unknown("generated-by-tool", "JSON");
        let script = [SHEBANG.to_string()];
        assert_eq!(
            resolve_language(&db, "data", SHEBANG, &script, b"// generated-by-tool\n", &config),
            Some("JSON".to_string())
        );
        assert_eq!(
            resolve_language(&db, "data", SHEBANG, &script, b"nothing here\n", &config),
            None
        );
        assert_eq!(
            resolve_language(
                &db,
                "a.rs",
                "Rust",
                &["Rust".to_string()],
                b"// generated-by-tool\n",
                &config
            ),
            Some("Rust".to_string())
        );
    }
}
