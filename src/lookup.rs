//! Single lookups outside the dashboard, for the `resolve` command.

use crate::error::ResolveError;
use crate::resolver::identifier::{is_resolvable, MIN_IDENTIFIER_LEN};
use crate::resolver::{Resolution, Resolver};

pub async fn resolve_once(
    resolver: &dyn Resolver,
    identifier: &str,
) -> Result<Resolution, ResolveError> {
    if !is_resolvable(identifier) {
        return Err(ResolveError::TooShort {
            min: MIN_IDENTIFIER_LEN,
        });
    }

    let body = resolver.resolve(identifier).await?;
    let resolution = Resolution::from_body(&body);
    tracing::info!(
        identifier,
        target = ?resolution.target(),
        can_follow = resolution.target().is_some(),
        "identifier resolved"
    );
    Ok(resolution)
}
