use errors::AppResult;
use vacancy_mailer::{cli, errors};

fn main() -> AppResult<()> {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| errors::AppError::IoError(e.to_string()))?;

    rt.block_on(cli::cli())?;
    Ok(())
}
