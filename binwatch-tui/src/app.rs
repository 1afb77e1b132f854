use binwatch_core::api::{AuthResponse, DashboardResponse};
use binwatch_core::overview::AuthorityOverview;
use binwatch_core::{PickupRequestView, PickupStatus, Role};

use crate::client::ApiClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Login,
    Resident,
    Overview,
    Pickups,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoginField {
    Email,
    Password,
}

pub(crate) struct App {
    pub client: ApiClient,

    pub screen: Screen,
    pub email_input: String,
    pub password_input: String,
    pub login_field: LoginField,
    pub user_name: Option<String>,
    pub role: Role,

    pub dashboard: Option<DashboardResponse>,

    pub overview: Option<AuthorityOverview>,
    pub house_list_index: usize,

    pub pickups: Vec<PickupRequestView>,
    pub pickup_list_index: usize,

    pub is_loading: bool,
    pub error_message: Option<String>,
    pub info_message: Option<String>,
}

impl App {
    pub(crate) fn new(client: ApiClient) -> Self {
        Self {
            client,
            screen: Screen::Login,
            email_input: String::new(),
            password_input: String::new(),
            login_field: LoginField::Email,
            user_name: None,
            role: Role::User,
            dashboard: None,
            overview: None,
            house_list_index: 0,
            pickups: Vec::new(),
            pickup_list_index: 0,
            is_loading: false,
            error_message: None,
            info_message: None,
        }
    }

    /// Switch to the home screen of the logged-in role.
    pub(crate) fn logged_in(&mut self, auth: &AuthResponse) {
        self.user_name = Some(auth.name.clone());
        self.role = auth.role;
        self.password_input.clear();
        self.screen = match auth.role {
            Role::User => Screen::Resident,
            Role::Authority => Screen::Overview,
        };
    }

    pub(crate) fn logout(&mut self) {
        self.client.logout();
        self.user_name = None;
        self.dashboard = None;
        self.overview = None;
        self.pickups.clear();
        self.house_list_index = 0;
        self.pickup_list_index = 0;
        self.screen = Screen::Login;
    }

    pub(crate) fn house_count(&self) -> usize {
        self.overview
            .as_ref()
            .map_or(0, |overview| overview.houses.len())
    }

    pub(crate) fn selected_pickup(&self) -> Option<&PickupRequestView> {
        self.pickups.get(self.pickup_list_index)
    }

    /// Mark a request accepted locally after the server confirmed it.
    pub(crate) fn mark_accepted(&mut self, index: usize) {
        if let Some(view) = self.pickups.get_mut(index) {
            view.request.status = PickupStatus::Accepted;
        }
    }
}
