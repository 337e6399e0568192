pub mod admin;
pub mod auth;
pub mod comments;
pub mod likes;
pub mod posts;
pub mod users;

/// Outcome of a mutation restricted to the owner of a row.
#[derive(Debug)]
pub enum Owned<T> {
    Done(T),
    NotFound,
    Forbidden,
}

/// Resolves the owner check for a row locked with `SELECT usuario_id ... FOR UPDATE`.
pub(crate) fn check_owner(owner_id: Option<i64>, actor_id: i64) -> Owned<()> {
    match owner_id {
        None => Owned::NotFound,
        Some(owner_id) if owner_id != actor_id => Owned::Forbidden,
        Some(_) => Owned::Done(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_check_outcomes() {
        assert!(matches!(check_owner(None, 1), Owned::NotFound));
        assert!(matches!(check_owner(Some(2), 1), Owned::Forbidden));
        assert!(matches!(check_owner(Some(1), 1), Owned::Done(())));
    }
}
