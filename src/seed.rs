//! 示例数据导入
//!
//! 幂等：邮箱已存在的用户直接跳过。

use tracing::{error, info, warn};

use crate::app::users::{
    error::UserError,
    model::{NewUser, UserForm},
    service::UserService,
    validation::ValidationError,
};

/// 固定的示例用户 (first_name, last_name, email, age, city)
pub const SEED_USERS: [(&str, &str, &str, i64, &str); 4] = [
    ("Fassih", "ul Hassny", "i221730@nu.edu.pk", 21, "Lahore"),
    ("Hunain", "Raza", "i221614@nu.edu.pk", 22, "Karachi"),
    ("Ahmed", "Umar", "i221580@nu.edu.pk", 22, "Rawalpindi"),
    ("Abdul", "Munim", "i227425@nu.edu.pk", 22, "Islamabad"),
];

pub fn seed_users() -> Vec<NewUser> {
    SEED_USERS
        .iter()
        .map(|&(first_name, last_name, email, age, city)| {
            NewUser::new(first_name, last_name, email, age, city)
        })
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub added: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl SeedReport {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// 逐条导入，走与表单新增相同的校验和创建流程；单条失败不影响其余记录
pub async fn run_seed(service: &UserService, users: &[NewUser]) -> SeedReport {
    let mut report = SeedReport::default();

    for user in users {
        let name = format!("{} {}", user.first_name, user.last_name);

        match service.find_by_email(&user.email).await {
            Ok(Some(_)) => {
                warn!(%name, email = %user.email, "User already exists");
                report.skipped += 1;
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                error!(%name, error = %e, "Error checking existing user");
                report.failed += 1;
                continue;
            }
        }

        match service.create_user(&UserForm::from(user)).await {
            Ok(created) => {
                info!(
                    id = created.id,
                    %name,
                    email = %created.email,
                    age = created.age,
                    city = %created.city,
                    "Added user"
                );
                report.added += 1;
            }
            Err(UserError::Invalid(ValidationError::DuplicateEmail)) => {
                warn!(%name, email = %user.email, "User already exists");
                report.skipped += 1;
            }
            Err(e) => {
                error!(%name, error = %e, "Error adding user");
                report.failed += 1;
            }
        }
    }

    info!(
        added = report.added,
        skipped = report.skipped,
        failed = report.failed,
        "Seeding finished"
    );
    report
}
