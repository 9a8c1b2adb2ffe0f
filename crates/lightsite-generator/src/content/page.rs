//! Template-rendered pages.

use std::{collections::BTreeMap, fmt, sync::Arc};

use lightsite_core::{Content, CoreError, GenContext, GenPath, Result};
use tracing::debug;

use crate::template::{TemplateContext, TemplateSource, toc_html};

/// A value computed from the generation context when the page is written.
pub type CtxFn = Arc<dyn Fn(&GenContext) -> String + Send + Sync>;

/// A template variable.
#[derive(Clone)]
pub enum Prop {
    /// A fixed value.
    Value(String),
    /// Evaluated at write time, when every task is known.
    FromCtx(CtxFn),
}

impl Prop {
    /// A prop evaluated lazily from the context.
    pub fn from_ctx(f: impl Fn(&GenContext) -> String + Send + Sync + 'static) -> Self {
        Self::FromCtx(Arc::new(f))
    }

    fn eval(&self, ctx: &GenContext) -> String {
        match self {
            Self::Value(value) => value.clone(),
            Self::FromCtx(f) => f(ctx),
        }
    }
}

impl fmt::Debug for Prop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::FromCtx(_) => f.write_str("FromCtx(..)"),
        }
    }
}

impl From<String> for Prop {
    fn from(value: String) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Prop {
    fn from(value: &str) -> Self {
        Self::Value(value.to_string())
    }
}

/// Evaluate props into template variables.
pub(crate) fn apply_props(vars: &mut TemplateContext, props: &BTreeMap<String, Prop>, ctx: &GenContext) {
    for (key, prop) in props {
        vars.insert(key.clone(), prop.eval(ctx));
    }
}

/// A page rendered from a template.
///
/// Besides the built-in page variables and its props, the page can list the
/// items of a collection as `{{ toc }}`.
#[derive(Debug, Clone)]
pub struct TemplatePage {
    template: TemplateSource,
    props: BTreeMap<String, Prop>,
    toc: Option<String>,
}

impl TemplatePage {
    pub fn new(template: impl Into<TemplateSource>) -> Self {
        Self {
            template: template.into(),
            props: BTreeMap::new(),
            toc: None,
        }
    }

    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, prop: impl Into<Prop>) -> Self {
        self.props.insert(key.into(), prop.into());
        self
    }

    /// Expose the collection at `path` as the `toc` variable.
    #[must_use]
    pub fn with_toc(mut self, path: impl Into<String>) -> Self {
        self.toc = Some(path.into());
        self
    }
}

impl Content for TemplatePage {
    fn write(&self, path: &GenPath, ctx: &GenContext) -> Result<()> {
        let render_err = |e: crate::template::TemplateError| CoreError::render(path.to_string(), e.to_string());
        let template = self.template.load(ctx).map_err(render_err)?;

        let mut vars = TemplateContext::for_page(path, ctx);
        if let Some(toc) = &self.toc {
            vars.insert("toc", toc_html(ctx, toc)?);
        }
        apply_props(&mut vars, &self.props, ctx);

        let html = template.render(&vars).map_err(render_err)?;
        path.create(html)?;
        debug!(location = %path, template = template.name(), "rendered page");
        Ok(())
    }
}
