use postboard_api_types::{Post, PostPayload};
use uuid::Uuid;

use crate::args::{PostContentArgs, PostsCmd};
use crate::client::{CliError, Ctx, UploadForm};
use crate::io::{read_image, read_value};
use crate::print::print_json;

pub async fn handle(ctx: &Ctx, cmd: PostsCmd) -> Result<(), CliError> {
    match cmd {
        PostsCmd::List => list(ctx).await,
        PostsCmd::Create(content) => create(ctx, content).await,
        PostsCmd::Update { id, content } => update(ctx, id, content).await,
        PostsCmd::Delete { id } => delete(ctx, id).await,
    }
}

async fn list(ctx: &Ctx) -> Result<(), CliError> {
    let posts = ctx.list_posts().await?;
    print_json(&posts)
}

/// Either an inline JSON payload or a multipart form, per `--upload`.
enum Submission {
    Json(PostPayload),
    Upload(UploadForm),
}

fn build_submission(content: PostContentArgs) -> Result<Submission, CliError> {
    let description = read_value(content.description, content.description_file)?;
    let image = read_image(&content.image)?;

    if content.upload {
        Ok(Submission::Upload(UploadForm {
            title: content.title,
            description,
            image,
        }))
    } else {
        Ok(Submission::Json(PostPayload::new(
            content.title,
            description,
            image.to_data_uri(),
        )))
    }
}

async fn create(ctx: &Ctx, content: PostContentArgs) -> Result<(), CliError> {
    let post: Post = match build_submission(content)? {
        Submission::Json(payload) => ctx.create_post(&payload).await?,
        Submission::Upload(form) => ctx.upload_post(form).await?,
    };
    print_json(&post)
}

async fn update(ctx: &Ctx, id: Uuid, content: PostContentArgs) -> Result<(), CliError> {
    let post = match build_submission(content)? {
        Submission::Json(payload) => ctx.update_post(id, &payload).await?,
        Submission::Upload(form) => ctx.upload_update(id, form).await?,
    };
    match post {
        Some(post) => print_json(&post),
        None => Err(CliError::NotFound(id)),
    }
}

async fn delete(ctx: &Ctx, id: Uuid) -> Result<(), CliError> {
    let res = ctx.delete_post(id).await?;
    print_json(&res)
}
