// Copyright (c) 2018 Weihang Lo
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Minified-sibling selection for CSS and JavaScript.
//!
//! The minified file is a durable sidecar: produced once under request
//! load, then reused by every later request that finds it fresh. A failure
//! anywhere in here degrades to serving the original file.

use std::fs;
use std::path::PathBuf;

use tracing::warn;

use crate::config::{Config, APPLICATION_JAVASCRIPT, TEXT_CSS};
use crate::extensions::PathExt;
use crate::server::sidecar::{self, Probe};
use crate::server::Representation;

/// Substitute `current_file` with a fresh minified sibling, producing one
/// if this build carries the matching minifier. Inputs already named
/// `*.min.css` / `*.min.js` are left alone.
pub fn apply(config: &Config, rep: &mut Representation) {
    if !config.defaults.minify {
        return;
    }
    let (ext, min_ext) = match rep.content_type.as_str() {
        TEXT_CSS => (".css", ".min.css"),
        APPLICATION_JAVASCRIPT => (".js", ".min.js"),
        _ => return,
    };
    // A `.less` file mapped onto text/css has no `.css` tail to replace.
    if rep.extension != ext {
        return;
    }
    let name = rep.current_file.filename_str();
    if name.ends_with(".min.css") || name.ends_with(".min.js") {
        return;
    }
    let candidate = match candidate_path(config, rep, ext, min_ext) {
        Some(candidate) => candidate,
        None => return,
    };
    let source_mtime = match rep.current_file.mtime() {
        Some(mtime) => mtime,
        None => return,
    };

    if let Probe::Fresh = sidecar::probe(&candidate, source_mtime) {
        rep.current_file = candidate;
        return;
    }

    if !config.minifiers.contains(&rep.content_type) {
        return;
    }
    let source = match fs::read_to_string(&rep.current_file) {
        Ok(source) => source,
        Err(err) => {
            warn!("Failed minifying {}: {}", rep.current_file.display(), err);
            return;
        }
    };
    let minified = match run_minifier(&rep.content_type, &source) {
        Ok(minified) if !minified.is_empty() => minified,
        Ok(_) => return,
        Err(err) => {
            warn!("Failed minifying {}: {}", rep.current_file.display(), err);
            return;
        }
    };

    if let Some(parent) = candidate.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    match sidecar::write_locked(&candidate, minified.as_bytes()) {
        Ok(()) => rep.current_file = candidate,
        Err(err) => {
            warn!("Failed minifying {}: {}", rep.current_file.display(), err);
        }
    }
}

/// Candidate name: the trailing `.css`/`.js` replaced with the `.min.`
/// form. With `min_cache_dir` set the candidate moves there instead, its
/// relative path flattened by encoding `/` as `%2F` so nested sources
/// never collide in the single cache directory.
fn candidate_path(
    config: &Config,
    rep: &Representation,
    ext: &str,
    min_ext: &str,
) -> Option<PathBuf> {
    match &config.min_cache_dir {
        Some(dir) => {
            let rel = rep.logical_path.trim_start_matches('/');
            let encoded = rel.replace('/', "%2F");
            let stem = encoded.strip_suffix(ext)?.to_owned();
            Some(config.root.join(dir).join(format!("{stem}{min_ext}")))
        }
        None => {
            let name = rep.current_file.filename_str();
            let stem = name.strip_suffix(ext)?.to_owned();
            Some(rep.current_file.with_file_name(format!("{stem}{min_ext}")))
        }
    }
}

fn run_minifier(content_type: &str, source: &str) -> Result<String, String> {
    match content_type {
        TEXT_CSS => minify_css(source),
        APPLICATION_JAVASCRIPT => minify_js(source),
        _ => Err("no minifier available".to_owned()),
    }
}

#[cfg(not(feature = "minify-css"))]
fn minify_css(_source: &str) -> Result<String, String> {
    Err("CSS minifier not compiled in".to_owned())
}

#[cfg(not(feature = "minify-js"))]
fn minify_js(_source: &str) -> Result<String, String> {
    Err("JavaScript minifier not compiled in".to_owned())
}

#[cfg(feature = "minify-css")]
fn minify_css(source: &str) -> Result<String, String> {
    use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};

    let mut stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| e.to_string())?;
    stylesheet
        .minify(MinifyOptions::default())
        .map_err(|e| e.to_string())?;
    let out = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(out.code)
}

#[cfg(feature = "minify-js")]
fn minify_js(source: &str) -> Result<String, String> {
    use oxc_allocator::Allocator;
    use oxc_codegen::{CodeGenerator, CodegenOptions};
    use oxc_minifier::{CompressOptions, Minifier, MinifierOptions};
    use oxc_parser::Parser;
    use oxc_span::SourceType;

    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if !parsed.errors.is_empty() {
        return Err(format!("{} syntax errors", parsed.errors.len()));
    }
    let mut program = parsed.program;
    let options = MinifierOptions {
        mangle: true,
        compress: CompressOptions::default(),
    };
    let minified = Minifier::new(options).build(&allocator, &mut program);
    Ok(CodeGenerator::new()
        .with_options(CodegenOptions {
            minify: true,
            ..CodegenOptions::default()
        })
        .with_mangler(minified.mangler)
        .build(&program)
        .code)
}

#[cfg(test)]
mod t {
    use super::*;
    use crate::test_utils::{backdate, rep_for, temp_root, write_file};
    use std::path::Path;

    const CSS: &[u8] = b"body {\n    color: #ff0000;\n}\n";

    fn config(root: &Path) -> Config {
        Config::new(root.to_owned())
    }

    #[cfg(feature = "minify-css")]
    #[test]
    fn produces_min_css_sidecar() {
        let root = temp_root();
        let source = write_file(root.path(), "style.css", CSS);
        let config = config(root.path());
        let mut rep = rep_for(&source, root.path(), "text/css");
        apply(&config, &mut rep);
        assert_eq!(rep.current_file, root.path().join("style.min.css"));
        let minified = fs::read_to_string(rep.current_file).unwrap();
        assert!(minified.len() < CSS.len());
        assert!(!minified.contains('\n'));
    }

    #[cfg(feature = "minify-css")]
    #[test]
    fn fresh_sidecar_is_reused() {
        let root = temp_root();
        let source = write_file(root.path(), "style.css", CSS);
        let sidecar = write_file(root.path(), "style.min.css", b"body{color:red}");
        backdate(&source, 60);
        let config = config(root.path());
        let mut rep = rep_for(&source, root.path(), "text/css");
        apply(&config, &mut rep);
        assert_eq!(rep.current_file, sidecar);
        // Reused verbatim, not regenerated.
        assert_eq!(fs::read(&sidecar).unwrap(), b"body{color:red}");
    }

    #[cfg(feature = "minify-css")]
    #[test]
    fn stale_sidecar_is_regenerated() {
        let root = temp_root();
        let source = write_file(root.path(), "style.css", CSS);
        let sidecar = write_file(root.path(), "style.min.css", b"outdated");
        backdate(&sidecar, 60);
        let config = config(root.path());
        let mut rep = rep_for(&source, root.path(), "text/css");
        apply(&config, &mut rep);
        assert_eq!(rep.current_file, sidecar);
        assert_ne!(fs::read(&sidecar).unwrap(), b"outdated");
    }

    #[test]
    fn min_input_is_never_minified_again() {
        let root = temp_root();
        let source = write_file(root.path(), "x.min.css", b"body{}");
        let config = config(root.path());
        let mut rep = rep_for(&source, root.path(), "text/css");
        apply(&config, &mut rep);
        assert_eq!(rep.current_file, source);
        assert!(!root.path().join("x.min.min.css").exists());
    }

    #[test]
    fn disabled_minify_is_a_no_op() {
        let root = temp_root();
        let source = write_file(root.path(), "style.css", CSS);
        let mut config = config(root.path());
        config.defaults.minify = false;
        let mut rep = rep_for(&source, root.path(), "text/css");
        apply(&config, &mut rep);
        assert_eq!(rep.current_file, source);
        assert!(!root.path().join("style.min.css").exists());
    }

    #[test]
    fn non_minifiable_type_is_a_no_op() {
        let root = temp_root();
        let source = write_file(root.path(), "style2.less", b".a { color: red; }");
        let config = config(root.path());
        let mut rep = rep_for(&source, root.path(), "text/stylesheet-less");
        apply(&config, &mut rep);
        assert_eq!(rep.current_file, source);
    }

    #[cfg(feature = "minify-css")]
    #[test]
    fn invalid_css_serves_original() {
        let root = temp_root();
        let source = write_file(root.path(), "broken.css", b"} body {");
        let config = config(root.path());
        let mut rep = rep_for(&source, root.path(), "text/css");
        apply(&config, &mut rep);
        assert_eq!(rep.current_file, source);
    }

    #[cfg(feature = "minify-css")]
    #[test]
    fn min_cache_dir_flattens_nested_paths() {
        let root = temp_root();
        let source = write_file(root.path(), "path/to/file.css", CSS);
        let mut config = config(root.path());
        config.min_cache_dir = Some("mincache".to_owned());
        let mut rep = rep_for(&source, root.path(), "text/css");
        apply(&config, &mut rep);
        assert_eq!(
            rep.current_file,
            root.path().join("mincache").join("path%2Fto%2Ffile.min.css"),
        );
        assert!(rep.current_file.exists());
        // Nothing lands beside the source when the cache dir is set.
        assert!(!root.path().join("path/to/file.min.css").exists());
    }

    #[cfg(feature = "minify-js")]
    #[test]
    fn produces_min_js_sidecar() {
        let root = temp_root();
        let source = write_file(
            root.path(),
            "script.js",
            b"function add(first, second) {\n    return first + second;\n}\nconsole.log(add(1, 2));\n",
        );
        let config = config(root.path());
        let mut rep = rep_for(&source, root.path(), "application/javascript");
        apply(&config, &mut rep);
        assert_eq!(rep.current_file, root.path().join("script.min.js"));
        assert!(rep.current_file.exists());
    }

    #[cfg(feature = "minify-js")]
    #[test]
    fn invalid_js_serves_original() {
        let root = temp_root();
        let source = write_file(root.path(), "broken.js", b"function ( {");
        let config = config(root.path());
        let mut rep = rep_for(&source, root.path(), "application/javascript");
        apply(&config, &mut rep);
        assert_eq!(rep.current_file, source);
    }
}
