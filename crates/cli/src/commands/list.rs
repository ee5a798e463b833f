//! List Command

use anyhow::Result;
use dbfixture::ResolvedFixture;
use serde::Serialize;

use super::Context;
use crate::output::{print_list, TableDisplay};

/// Fixture display wrapper for serialization
#[derive(Serialize)]
pub struct FixtureDisplay {
    pub name: String,
    pub format: String,
    pub path: String,
    pub modified: String,
}

impl From<ResolvedFixture> for FixtureDisplay {
    fn from(fixture: ResolvedFixture) -> Self {
        let modified = std::fs::metadata(&fixture.path)
            .and_then(|m| m.modified())
            .map(|t| {
                chrono::DateTime::<chrono::Local>::from(t)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string()
            })
            .unwrap_or_default();

        Self {
            name: fixture.name,
            format: fixture.format.to_string(),
            path: fixture.path.display().to_string(),
            modified,
        }
    }
}

impl TableDisplay for FixtureDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "Format", "Path", "Modified"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.name.clone(),
            self.format.clone(),
            self.path.clone(),
            self.modified.clone(),
        ]
    }
}

pub fn execute(ctx: &Context) -> Result<()> {
    let fixtures: Vec<FixtureDisplay> = ctx
        .resolver()
        .list()
        .into_iter()
        .map(FixtureDisplay::from)
        .collect();
    print_list(&fixtures, ctx.format);
    Ok(())
}
