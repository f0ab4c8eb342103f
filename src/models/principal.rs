use crate::error::{Error, Result};
use crate::models::employer::Employer;
use crate::models::user::User;

/// The authenticated account behind a request.
#[derive(Debug, Clone)]
pub enum Principal {
    User(User),
    Employer(Employer),
}

impl Principal {
    pub fn email(&self) -> &str {
        match self {
            Principal::User(user) => &user.email,
            Principal::Employer(employer) => &employer.email,
        }
    }

    pub fn into_user(self) -> Result<User> {
        match self {
            Principal::User(user) => Ok(user),
            Principal::Employer(_) => Err(Error::Unauthorized(
                "only users can access this endpoint".to_string(),
            )),
        }
    }

    pub fn into_employer(self) -> Result<Employer> {
        match self {
            Principal::Employer(employer) => Ok(employer),
            Principal::User(_) => Err(Error::Unauthorized(
                "only employers can access this endpoint".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn employer() -> Employer {
        Employer {
            id: 2,
            company_id: 3,
            full_name: "Eve".into(),
            email: "eve@acme.io".into(),
            hashed_password: String::new(),
            is_email_verified: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn wrong_actor_kind_is_unauthorized() {
        let principal = Principal::Employer(employer());
        assert_eq!(principal.email(), "eve@acme.io");
        match principal.clone().into_user() {
            Err(Error::Unauthorized(msg)) => assert_eq!(msg, "only users can access this endpoint"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(principal.into_employer().unwrap().company_id, 3);
    }
}
