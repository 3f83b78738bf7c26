use swc_core::{
    common::errors::HANDLER,
    ecma::{ast::Program, visit::VisitMutWith},
    plugin::{
        metadata::TransformPluginMetadataContextKind, plugin_transform,
        proxies::TransformPluginProgramMetadata,
    },
};

pub mod config;
pub mod error;
pub mod module_map;
pub mod rewrite;

pub use config::PluginConfig;
pub use error::ConfigError;
pub use module_map::{resolve, EnvironmentMode, ModuleMap, DEFAULT_MODULE_PREFIX};
pub use rewrite::{RewriteConfig, RewriteModules};

/// Build the rewriter from the raw plugin config and the host's `env` name.
pub fn rewriter_from_plugin_config(
    raw_config: &str,
    env_name: Option<&str>,
) -> Result<RewriteModules, ConfigError> {
    let plugin_config = PluginConfig::from_json_str(raw_config)?;
    Ok(RewriteModules::new(plugin_config.into_rewrite_config(env_name)))
}

// -----------------------------------------------------------------------------
// Entrypoint
// -----------------------------------------------------------------------------

#[plugin_transform]
pub fn process_transform(mut program: Program, metadata: TransformPluginProgramMetadata) -> Program {
    let raw_config = metadata.get_transform_plugin_config().unwrap_or_default();
    // `env` plays the role of NODE_ENV: "test" under the test runner
    let env_name = metadata.get_context(&TransformPluginMetadataContextKind::Env);

    let mut rewriter = match rewriter_from_plugin_config(&raw_config, env_name.as_deref()) {
        Ok(rewriter) => rewriter,
        Err(err) => {
            HANDLER.with(|handler| handler.err(&format!("rewrite_modules_swc_plugin: {err}")));
            return program;
        }
    };

    program.visit_mut_with(&mut rewriter);
    program
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use swc_core::{
        common::{sync::Lrc, FileName, SourceMap, GLOBALS},
        ecma::{
            ast::Module,
            codegen::{text_writer::JsWriter, Config, Emitter},
            parser::{lexer::Lexer, EsSyntax, Parser, StringInput, Syntax},
        },
    };

    use super::*;

    fn rewrite(raw_config: &str, env_name: Option<&str>, code: &str) -> String {
        GLOBALS.set(&Default::default(), || {
            let cm: Lrc<SourceMap> = Default::default();
            let fm = cm.new_source_file(
                Lrc::new(FileName::Custom("input.js".into())),
                code.to_string(),
            );
            let lexer = Lexer::new(
                Syntax::Es(EsSyntax::default()),
                Default::default(),
                StringInput::from(&*fm),
                None,
            );
            let mut module: Module = Parser::new_from(lexer)
                .parse_module()
                .expect("failed to parse module");

            let mut rewriter =
                rewriter_from_plugin_config(raw_config, env_name).expect("valid plugin config");
            module.visit_mut_with(&mut rewriter);

            let mut buf = Vec::new();
            {
                let mut emitter = Emitter {
                    cfg: Config::default(),
                    comments: None,
                    cm: cm.clone(),
                    wr: JsWriter::new(cm.clone(), "\n", &mut buf, None),
                };
                emitter.emit_module(&module).expect("failed to emit module");
            }
            String::from_utf8(buf).expect("module is not valid UTF-8")
        })
    }

    const SOURCE: &str = r#"require("promise"); require("invariant"); jest.dontMock("warning");"#;
    const CONFIG: &str = r#"{ "moduleMap": { "promise": "promise/lib" }, "modulePrefix": "fbjs/lib/" }"#;

    #[test]
    fn test_env_keeps_unmapped_names() {
        assert_eq!(
            rewrite(CONFIG, Some("test"), SOURCE),
            "require(\"promise/lib\");\nrequire(\"invariant\");\njest.dontMock(\"warning\");\n"
        );
    }

    #[test]
    fn production_env_prefixes_unmapped_names() {
        assert_eq!(
            rewrite(CONFIG, Some("production"), SOURCE),
            "require(\"promise/lib\");\nrequire(\"fbjs/lib/invariant\");\njest.dontMock(\"fbjs/lib/warning\");\n"
        );
    }

    #[test]
    fn explicit_mode_overrides_env() {
        assert_eq!(
            rewrite(r#"{ "mode": "normal" }"#, Some("test"), r#"require("invariant");"#),
            "require(\"./invariant\");\n"
        );
    }

    #[test]
    fn missing_config_uses_defaults() {
        assert_eq!(rewrite("", None, r#"require("invariant");"#), "require(\"./invariant\");\n");
    }

    #[test]
    fn malformed_config_is_an_error() {
        GLOBALS.set(&Default::default(), || {
            let err = rewriter_from_plugin_config(r#"{ "moduleMap": [] }"#, None)
                .err()
                .expect("config should be rejected");
            assert!(matches!(err, ConfigError::InvalidPluginConfig { .. }));
            assert!(err.to_string().starts_with("invalid plugin config"));
        });
    }
}
