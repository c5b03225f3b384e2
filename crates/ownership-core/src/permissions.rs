use ownership_domain::{HolderRef, OwnershipError, Permission, UserLogin};

pub trait PermissionEvaluator: Send + Sync {
    fn has_permission(&self, user: &UserLogin, permission: Permission, target: &HolderRef) -> bool;
}

/// Grants everything. For deployments where access control happens upstream.
#[derive(Debug, Clone, Copy, Default)]
pub struct GrantAll;

impl PermissionEvaluator for GrantAll {
    fn has_permission(
        &self,
        _user: &UserLogin,
        _permission: Permission,
        _target: &HolderRef,
    ) -> bool {
        true
    }
}

pub(crate) fn require(
    evaluator: &dyn PermissionEvaluator,
    user: &UserLogin,
    permission: Permission,
    target: &HolderRef,
) -> Result<(), OwnershipError> {
    if evaluator.has_permission(user, permission, target) {
        Ok(())
    } else {
        Err(OwnershipError::AccessDenied {
            permission,
            target: target.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use ownership_domain::{ExecutionId, HolderRef, OwnershipError, Permission, UserLogin};

    use super::{require, GrantAll};
    use crate::test_support::StaticPermissions;

    #[test]
    fn denial_names_the_permission_and_target() {
        let evaluator = StaticPermissions::default().deny("bob", Permission::Write);
        let target = HolderRef::Execution(ExecutionId::new(3));

        let error = require(&evaluator, &UserLogin::from("bob"), Permission::Write, &target)
            .expect_err("denied");

        assert_eq!(
            error,
            OwnershipError::AccessDenied {
                permission: Permission::Write,
                target: "execution 3".to_owned(),
            }
        );
        assert!(require(&evaluator, &UserLogin::from("bob"), Permission::Read, &target).is_ok());
        assert!(require(&GrantAll, &UserLogin::from("bob"), Permission::Write, &target).is_ok());
    }
}
