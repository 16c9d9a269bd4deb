//! `keeper whoami`

use serde::Serialize;

use crate::context::AppContext;
use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};

#[derive(Serialize)]
struct WhoamiOutput {
    user_id: String,
    logged_in: bool,
    data_dir: String,
}

pub fn run(ctx: &AppContext, output: OutputOptions) -> Result<()> {
    let identity = ctx.identity();
    let data = WhoamiOutput {
        user_id: identity.user_id().to_string(),
        logged_in: identity.is_logged_in(),
        data_dir: ctx.paths().root().display().to_string(),
    };

    let mut human = HumanOutput::new("Local identity");
    human.push_summary("User", data.user_id.clone());
    human.push_summary("Data dir", data.data_dir.clone());

    emit_success(output, "whoami", &data, Some(&human))
}
