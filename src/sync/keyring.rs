use std::collections::HashMap;

use crate::error::{SyncError, SyncResult};

pub(crate) const SERVICE_NAME: &str = "lifeboard";

fn keyring_error(action: &str, e: impl std::fmt::Display) -> SyncError {
    SyncError::Keyring(format!("{}: {}", action, e))
}

fn attributes<'a>(server: &'a str, user_name: &'a str) -> HashMap<&'a str, &'a str> {
    let mut attrs = HashMap::new();
    attrs.insert("service", SERVICE_NAME);
    attrs.insert("server", server);
    attrs.insert("user", user_name);
    attrs
}

/// Store the login password for `user_name` at `server` via Secret Service.
pub async fn store_password(server: &str, user_name: &str, password: &str) -> SyncResult<()> {
    let keyring = oo7::Keyring::new()
        .await
        .map_err(|e| keyring_error("Failed to connect to keyring", e))?;

    keyring
        .create_item(
            &format!("Lifeboard login ({}@{})", user_name, server),
            &attributes(server, user_name),
            password.as_bytes(),
            true,
        )
        .await
        .map_err(|e| keyring_error("Failed to store password", e))?;

    Ok(())
}

pub async fn load_password(server: &str, user_name: &str) -> SyncResult<Option<String>> {
    let keyring = oo7::Keyring::new()
        .await
        .map_err(|e| keyring_error("Failed to connect to keyring", e))?;

    let items = keyring
        .search_items(&attributes(server, user_name))
        .await
        .map_err(|e| keyring_error("Failed to search keyring", e))?;

    let Some(item) = items.first() else {
        return Ok(None);
    };
    let secret = item
        .secret()
        .await
        .map_err(|e| keyring_error("Failed to read secret", e))?;
    let password = String::from_utf8(secret.to_vec())
        .map_err(|e| keyring_error("Invalid UTF-8 in secret", e))?;
    Ok(Some(password))
}

pub async fn delete_password(server: &str, user_name: &str) -> SyncResult<()> {
    let keyring = oo7::Keyring::new()
        .await
        .map_err(|e| keyring_error("Failed to connect to keyring", e))?;

    let items = keyring
        .search_items(&attributes(server, user_name))
        .await
        .map_err(|e| keyring_error("Failed to search keyring", e))?;

    for item in items {
        item.delete()
            .await
            .map_err(|e| keyring_error("Failed to delete password", e))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_scope_by_server_and_user() {
        let attrs = attributes("https://home.test/api", "alice");
        assert_eq!(attrs.get("service"), Some(&SERVICE_NAME));
        assert_eq!(attrs.get("server"), Some(&"https://home.test/api"));
        assert_eq!(attrs.get("user"), Some(&"alice"));
    }
}
