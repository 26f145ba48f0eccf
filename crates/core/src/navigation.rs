//! Role-based navigation menus.
//!
//! Each role sees a fixed, ordered list of screens. The tables are constants;
//! [`menu_for`] and [`start_route_for`] are pure lookups that match the role
//! name case-insensitively and fall back to a single "about" entry for
//! anything unrecognised.

use core::fmt;
use core::str::FromStr;

use serde::Serialize;

use crate::RoleKind;

/// A top-level destination in the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    Authors,
    Genres,
    Publishers,
    Products,
    Users,
    Roles,
    Sales,
    About,
}

impl Route {
    /// All routes, in menu order for the most privileged role.
    pub const ALL: [Self; 8] = [
        Self::Authors,
        Self::Genres,
        Self::Publishers,
        Self::Products,
        Self::Users,
        Self::Roles,
        Self::Sales,
        Self::About,
    ];

    /// Route name as used in navigation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Authors => "authors",
            Self::Genres => "genres",
            Self::Publishers => "publishers",
            Self::Products => "products",
            Self::Users => "users",
            Self::Roles => "roles",
            Self::Sales => "sales",
            Self::About => "about",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for an unknown route name.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown route: {0}")]
pub struct UnknownRoute(pub String);

impl FromStr for Route {
    type Err = UnknownRoute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|route| route.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRoute(s.to_owned()))
    }
}

/// Icon hint for a menu entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Person,
    List,
    Business,
    Book,
    ShoppingCart,
    Info,
}

/// One navigation entry: where it goes, what it is called, how it looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Screen {
    pub route: Route,
    pub label: &'static str,
    pub icon: Icon,
}

impl Screen {
    const fn new(route: Route, label: &'static str, icon: Icon) -> Self {
        Self { route, label, icon }
    }
}

const AUTHORS: Screen = Screen::new(Route::Authors, "Authors", Icon::Person);
const GENRES: Screen = Screen::new(Route::Genres, "Genres", Icon::List);
const PUBLISHERS: Screen = Screen::new(Route::Publishers, "Publishers", Icon::Business);
const PRODUCTS: Screen = Screen::new(Route::Products, "Products", Icon::Book);
const USERS: Screen = Screen::new(Route::Users, "Users", Icon::Person);
const ROLES: Screen = Screen::new(Route::Roles, "Roles", Icon::List);
const SALES: Screen = Screen::new(Route::Sales, "Sales", Icon::ShoppingCart);
const ABOUT: Screen = Screen::new(Route::About, "About", Icon::Info);

const ADMIN_MENU: &[Screen] = &[AUTHORS, GENRES, PUBLISHERS, PRODUCTS, USERS, ROLES, SALES];
const CONSULTANT_MENU: &[Screen] = &[PRODUCTS, ABOUT];
const SELLER_MENU: &[Screen] = &[PRODUCTS, SALES, ABOUT];
const FALLBACK_MENU: &[Screen] = &[ABOUT];

/// Navigation entries for a role.
///
/// ```
/// use bookshop_core::{menu_for, Route};
///
/// assert_eq!(menu_for("ADMIN"), menu_for("admin"));
/// assert_eq!(menu_for("seller")[1].route, Route::Sales);
/// assert_eq!(menu_for("unknown-role").len(), 1);
/// ```
#[must_use]
pub fn menu_for(role: &str) -> &'static [Screen] {
    match RoleKind::classify(role) {
        RoleKind::Admin => ADMIN_MENU,
        RoleKind::Consultant => CONSULTANT_MENU,
        RoleKind::Seller => SELLER_MENU,
        RoleKind::Other(_) => FALLBACK_MENU,
    }
}

/// First screen shown after login for a role.
#[must_use]
pub fn start_route_for(role: &str) -> Route {
    match RoleKind::classify(role) {
        RoleKind::Admin => Route::Authors,
        RoleKind::Consultant | RoleKind::Seller => Route::Products,
        RoleKind::Other(_) => Route::About,
    }
}

/// Whether `route` appears in the menu for `role`.
#[must_use]
pub fn allows(role: &str, route: Route) -> bool {
    menu_for(role).iter().any(|screen| screen.route == route)
}

/// Whether `role` may mutate products and create sales.
#[must_use]
pub fn can_edit(role: &str) -> bool {
    RoleKind::classify(role).can_edit()
}

#[cfg(test)]
#[allow(clippy::indexing_slicing, clippy::unwrap_used)]
mod tests {
    use super::*;

    fn routes(role: &str) -> Vec<Route> {
        menu_for(role).iter().map(|s| s.route).collect()
    }

    #[test]
    fn test_menu_is_case_insensitive() {
        assert_eq!(menu_for("ADMIN"), menu_for("admin"));
        assert_eq!(menu_for("Seller"), menu_for("seller"));
        assert_eq!(menu_for("CONSULTANT"), menu_for("consultant"));
    }

    #[test]
    fn test_admin_menu_order() {
        assert_eq!(
            routes("admin"),
            vec![
                Route::Authors,
                Route::Genres,
                Route::Publishers,
                Route::Products,
                Route::Users,
                Route::Roles,
                Route::Sales,
            ]
        );
    }

    #[test]
    fn test_consultant_and_seller_menus() {
        assert_eq!(routes("consultant"), vec![Route::Products, Route::About]);
        assert_eq!(
            routes("seller"),
            vec![Route::Products, Route::Sales, Route::About]
        );
    }

    #[test]
    fn test_unknown_role_gets_fallback() {
        let menu = menu_for("unknown-role");
        assert_eq!(menu.len(), 1);
        assert_eq!(menu[0].route, Route::About);
        assert_eq!(menu_for(""), menu);
    }

    #[test]
    fn test_start_routes() {
        assert_eq!(start_route_for("Admin"), Route::Authors);
        assert_eq!(start_route_for("consultant"), Route::Products);
        assert_eq!(start_route_for("SELLER"), Route::Products);
        assert_eq!(start_route_for("visitor"), Route::About);
    }

    #[test]
    fn test_start_route_is_in_menu() {
        for role in ["admin", "consultant", "seller", "other"] {
            assert!(allows(role, start_route_for(role)), "{role}");
        }
    }

    #[test]
    fn test_allows() {
        assert!(allows("admin", Route::Roles));
        assert!(!allows("seller", Route::Users));
        assert!(!allows("consultant", Route::Sales));
    }

    #[test]
    fn test_can_edit() {
        assert!(can_edit("ADMIN"));
        assert!(can_edit("seller"));
        assert!(!can_edit("consultant"));
    }

    #[test]
    fn test_route_from_str() {
        assert_eq!("Sales".parse::<Route>().unwrap(), Route::Sales);
        assert!("checkout".parse::<Route>().is_err());
    }
}
