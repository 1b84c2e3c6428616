//! Built-in template helpers

use crate::state::serialize_state;
use handlebars::{
    Context, Handlebars, Helper, HelperResult, Output, RenderContext, RenderError, RenderErrorReason,
};

/// Register all built-in helpers
pub fn register_builtin_helpers(handlebars: &mut Handlebars) {
    handlebars.register_helper("json", Box::new(json_helper));
}

fn param_missing(helper: &'static str, index: usize) -> RenderError {
    RenderErrorReason::ParamNotFoundForIndex(helper, index).into()
}

/// Script-safe JSON of a value: {{{json data}}}
fn json_helper(
    h: &Helper,
    _: &Handlebars,
    _: &Context,
    _: &mut RenderContext,
    out: &mut dyn Output,
) -> HelperResult {
    let param = h.param(0).ok_or_else(|| param_missing("json", 0))?;

    out.write(&serialize_state(param.value()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> Handlebars<'static> {
        let mut handlebars = Handlebars::new();
        register_builtin_helpers(&mut handlebars);
        handlebars
    }

    #[test]
    fn test_json_helper_is_script_safe() {
        let handlebars = registry();
        let out = handlebars
            .render_template("{{{json data}}}", &json!({"data": {"s": "</script>"}}))
            .unwrap();
        assert_eq!(out, r#"{"s":"\u003C\u002Fscript\u003E"}"#);
    }

    #[test]
    fn test_builtin_eq_still_available() {
        let handlebars = registry();
        let template = "{{#if (eq page \"home\")}}active{{else}}idle{{/if}}";
        assert_eq!(handlebars.render_template(template, &json!({"page": "home"})).unwrap(), "active");
        assert_eq!(handlebars.render_template(template, &json!({"page": "about"})).unwrap(), "idle");
    }

    #[test]
    fn test_missing_param_fails() {
        let handlebars = registry();
        assert!(handlebars.render_template("{{json}}", &json!({})).is_err());
    }
}
