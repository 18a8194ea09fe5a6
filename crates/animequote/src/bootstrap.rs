//! First-start setup of the administrative account

use std::path::Path;

use rand::RngExt;
use tokio::io::AsyncWriteExt;

use crate::prelude::*;

pub const CREDENTIALS_FILE: &str = "credentials.txt";
const PASSWORD_LENGTH: usize = 24;

/// Generates a random alphanumeric password
pub fn random_password() -> String {
	const SAFE: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789";
	let mut rng = rand::rng();
	(0..PASSWORD_LENGTH).map(|_| char::from(SAFE[rng.random_range(0..SAFE.len())])).collect()
}

async fn write_credentials(dir: &Path, username: &str, password: &str, token: &str) -> ClResult<()> {
	tokio::fs::create_dir_all(dir).await?;
	let path = dir.join(CREDENTIALS_FILE);
	let contents = format!(
		"Admin credentials\n\nUsername: {}\nPassword: {}\nAPI token: {}\n",
		username, password, token
	);
	let mut options = tokio::fs::OpenOptions::new();
	options.write(true).create(true).truncate(true);
	#[cfg(unix)]
	options.mode(0o600);
	let mut file = options.open(&path).await?;

	// An existing file keeps its old mode on open
	#[cfg(unix)]
	{
		use std::os::unix::fs::PermissionsExt;
		file.set_permissions(std::fs::Permissions::from_mode(0o600)).await?;
	}

	file.write_all(contents.as_bytes()).await?;
	file.flush().await?;

	info!("Admin credentials written to {}", path.display());
	Ok(())
}

/// Creates the admin user if it does not exist yet. Returns true if created.
pub async fn ensure_admin(app: &App) -> ClResult<bool> {
	let username = &app.opts.admin_user;
	if app.auth_adapter.read_admin(username).await?.is_some() {
		debug!("Admin user {} already exists", username);
		return Ok(false);
	}

	let password = match &app.opts.admin_password {
		Some(password) => password.to_string(),
		None => random_password(),
	};
	let admin = app.auth_adapter.create_admin(username, &password).await?;
	info!("Created admin user {}", admin.username);
	info!("Admin API token: {}", admin.token);

	if let Err(err) = write_credentials(&app.opts.data_dir, username, &password, &admin.token).await {
		warn!("Could not write admin credentials file: {}", err);
	}
	Ok(true)
}


// vim: ts=4
