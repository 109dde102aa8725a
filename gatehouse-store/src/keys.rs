/// Builds the namespaced keys used in the revocation store.
///
/// Every key except the refresh coordination key is prefixed with the
/// application name, so several deployments can share one store.
///
/// ```
/// use gatehouse_store::KeySpace;
///
/// let keys = KeySpace::new("shop");
/// assert_eq!(keys.blacklist(["4f1c"]), "shop:blacklist:4f1c");
/// assert_eq!(keys.role("u1"), "shop:role:u1");
/// assert_eq!(KeySpace::refresh("shop-api:api", "u1"), "shop-api:api:u1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    app_name: String,
}

const BLACKLIST: &str = "blacklist";
const ROLE: &str = "role";
const TEMPORARY: &str = "temporary";

impl KeySpace {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    /// `<app>:<part>:<part>...`
    pub fn key<I, S>(&self, parts: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut key = self.app_name.clone();
        for part in parts {
            key.push(':');
            key.push_str(part.as_ref());
        }
        key
    }

    /// `<app>:blacklist:<discriminator>...`
    pub fn blacklist<I, S>(&self, parts: I) -> String
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut key = self.key([BLACKLIST]);
        for part in parts {
            key.push(':');
            key.push_str(part.as_ref());
        }
        key
    }

    /// Cached role scope of `user`
    pub fn role(&self, user: &str) -> String {
        self.key([ROLE, user])
    }

    /// Cached temporary scope of `user`
    pub fn temporary(&self, user: &str) -> String {
        self.key([TEMPORARY, user])
    }

    /// Refresh record key. The issuer already carries the deployment
    /// namespace, so no application prefix is added.
    pub fn refresh(issuer: &str, subject: &str) -> String {
        format!("{}:{}", issuer, subject)
    }
}
