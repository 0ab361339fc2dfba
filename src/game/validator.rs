use uuid::Uuid;

use crate::{db::GridStore, error::StoreError};

/// Outcome of checking an answer against the membership table
#[derive(Debug)]
pub enum Validation {
    Correct,
    Incorrect,
    /// Membership lookup failed; treated as incorrect so the game can go on
    Unverified(StoreError),
}

impl Validation {
    pub fn is_correct(&self) -> bool {
        matches!(self, Validation::Correct)
    }
}

pub struct MembershipValidator<'a> {
    store: &'a dyn GridStore,
}

impl<'a> MembershipValidator<'a> {
    pub fn new(store: &'a dyn GridStore) -> Self {
        Self { store }
    }

    /// Correct iff the user belongs to both the row and the column category
    pub async fn check(
        &self,
        user_id: Uuid,
        row_category_id: Uuid,
        column_category_id: Uuid,
    ) -> Validation {
        match self.store.fetch_membership(user_id).await {
            Ok(categories)
                if categories.contains(&row_category_id)
                    && categories.contains(&column_category_id) =>
            {
                Validation::Correct
            }
            Ok(_) => Validation::Incorrect,
            Err(e) => Validation::Unverified(e),
        }
    }

    /// `check` collapsed to a yes/no. A failed lookup is logged and counts as no.
    pub async fn is_valid_answer(
        &self,
        user_id: Uuid,
        row_category_id: Uuid,
        column_category_id: Uuid,
    ) -> bool {
        let validation = self
            .check(user_id, row_category_id, column_category_id)
            .await;
        if let Validation::Unverified(e) = &validation {
            tracing::error!(
                "Failed to fetch membership for user {}, answer treated as incorrect: {}",
                user_id,
                e
            );
        }
        validation.is_correct()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{testing::FailingStore, MemoryStore};

    struct Fixture {
        store: MemoryStore,
        user: Uuid,
        row: Uuid,
        col: Uuid,
    }

    fn fixture(memberships: &[usize]) -> Fixture {
        // index 0 = row, 1 = column, 2 = unrelated
        let ids = [Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4()];
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        for &i in memberships {
            store.add_membership(user, ids[i]);
        }
        Fixture {
            store,
            user,
            row: ids[0],
            col: ids[1],
        }
    }

    #[tokio::test]
    async fn test_member_of_both_is_correct() {
        let f = fixture(&[0, 1]);
        let validator = MembershipValidator::new(&f.store);
        assert!(validator.is_valid_answer(f.user, f.row, f.col).await);
    }

    #[tokio::test]
    async fn test_superset_is_correct() {
        let f = fixture(&[0, 1, 2]);
        let validator = MembershipValidator::new(&f.store);
        assert!(validator.is_valid_answer(f.user, f.row, f.col).await);
    }

    #[tokio::test]
    async fn test_partial_membership_is_incorrect() {
        let cases: [&[usize]; 5] = [&[0], &[1], &[2], &[0, 2], &[1, 2]];
        for memberships in cases {
            let f = fixture(memberships);
            let validator = MembershipValidator::new(&f.store);
            assert!(
                !validator.is_valid_answer(f.user, f.row, f.col).await,
                "memberships {:?} should not validate",
                memberships
            );
        }
    }

    #[tokio::test]
    async fn test_no_membership_is_incorrect() {
        let f = fixture(&[]);
        let validator = MembershipValidator::new(&f.store);
        assert!(matches!(
            validator.check(f.user, f.row, f.col).await,
            Validation::Incorrect
        ));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_unverified_and_not_correct() {
        let store = FailingStore;
        let validator = MembershipValidator::new(&store);
        let (user, row, col) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

        let validation = validator.check(user, row, col).await;
        assert!(!validation.is_correct());
        assert!(matches!(
            validation,
            Validation::Unverified(StoreError::Unavailable(_))
        ));
        assert!(!validator.is_valid_answer(user, row, col).await);
    }
}
