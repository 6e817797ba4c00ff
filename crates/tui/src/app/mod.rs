use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEventKind};
use tally_core::{AuthContext, Dashboard, HttpGateway, HttpIdentityProvider, SessionStore};
use std::sync::Arc;

use crate::{
    config::AppConfig,
    entry,
    error::Result,
    ui::{self, keymap::AppAction},
};

const POLL_INTERVAL: Duration = Duration::from_millis(200);
const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Login,
    SignUp,
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

#[derive(Default)]
pub struct LoginState {
    pub email: String,
    pub password: String,
    pub focus: LoginField,
    pub message: Option<String>,
}

impl Default for LoginField {
    fn default() -> Self {
        Self::Email
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpField {
    Name,
    Email,
    Password,
    Confirm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignUpMode {
    Form,
    Verify,
}

pub struct SignUpState {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
    pub code: String,
    pub mode: SignUpMode,
    pub focus: SignUpField,
    pub message: Option<String>,
}

impl Default for SignUpState {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            password: String::new(),
            confirm: String::new(),
            code: String::new(),
            mode: SignUpMode::Form,
            focus: SignUpField::Name,
            message: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    None,
    AddExpense,
    EditBudget,
}

pub struct DashboardUi {
    pub selected: usize,
    pub input_mode: InputMode,
    pub input: String,
}

impl Default for DashboardUi {
    fn default() -> Self {
        Self {
            selected: 0,
            input_mode: InputMode::None,
            input: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Success,
    Error,
}

pub struct ToastState {
    pub message: String,
    pub level: ToastLevel,
    pub expires_at: Instant,
}

/// Everything the draw pass needs that is not domain state.
pub struct AppState {
    pub screen: Screen,
    pub login: LoginState,
    pub signup: SignUpState,
    pub dash: DashboardUi,
    pub toast: Option<ToastState>,
    pub user_email: Option<String>,
}

impl AppState {
    fn new(screen: Screen, user_email: Option<String>) -> Self {
        Self {
            screen,
            login: LoginState::default(),
            signup: SignUpState::default(),
            dash: DashboardUi::default(),
            toast: None,
            user_email,
        }
    }
}

pub struct App {
    config: AppConfig,
    auth: AuthContext<HttpIdentityProvider>,
    dashboard: Dashboard<HttpGateway<HttpIdentityProvider>>,
    state: AppState,
    should_quit: bool,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let provider = HttpIdentityProvider::new(&config.auth_base_url, &config.client_id)?;
        let store = Arc::new(SessionStore::new(provider, &config.session_path));
        let mut auth = AuthContext::new(store);
        auth.initialize();

        let gateway = HttpGateway::new(&config.api_base_url, auth.store())?;
        let dashboard = Dashboard::new(gateway);

        let screen = if auth.is_authenticated() {
            Screen::Dashboard
        } else {
            Screen::Login
        };
        let user_email = auth.session().map(|s| s.email.clone());

        Ok(Self {
            config,
            auth,
            dashboard,
            state: AppState::new(screen, user_email),
            should_quit: false,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = ui::setup_terminal()?;

        if self.auth.is_authenticated()
            && let Err(err) = self.dashboard.load_data().await
        {
            self.report_core_error(err);
        }

        while !self.should_quit {
            terminal.draw(|frame| ui::render(frame, &self.state, &self.dashboard))?;

            if event::poll(POLL_INTERVAL)?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
            {
                self.handle_action(ui::keymap::map_key(key)).await;
            }

            self.expire_toast();
        }

        ui::restore_terminal(&mut terminal)?;
        Ok(())
    }

    async fn handle_action(&mut self, action: AppAction) {
        if action == AppAction::Quit {
            self.should_quit = true;
            return;
        }
        match self.state.screen {
            Screen::Login => self.handle_login(action).await,
            Screen::SignUp => self.handle_signup(action).await,
            Screen::Dashboard => self.handle_dashboard(action).await,
        }
    }

    async fn handle_login(&mut self, action: AppAction) {
        match action {
            AppAction::Input(ch) => self.login_field_mut().push(ch),
            AppAction::Backspace => {
                self.login_field_mut().pop();
            }
            AppAction::NextField => {
                self.state.login.focus = match self.state.login.focus {
                    LoginField::Email => LoginField::Password,
                    LoginField::Password => LoginField::Email,
                };
            }
            AppAction::NewAccount => {
                self.state.signup = SignUpState::default();
                self.state.screen = Screen::SignUp;
            }
            AppAction::Cancel => self.state.login.message = None,
            AppAction::Submit => self.submit_login().await,
            _ => {}
        }
    }

    fn login_field_mut(&mut self) -> &mut String {
        match self.state.login.focus {
            LoginField::Email => &mut self.state.login.email,
            LoginField::Password => &mut self.state.login.password,
        }
    }

    async fn submit_login(&mut self) {
        let email = self.state.login.email.trim().to_owned();
        let password = self.state.login.password.clone();
        match self.auth.sign_in(&email, &password).await {
            Ok(()) => {
                tracing::info!(%email, "signed in");
                self.state.user_email = self.auth.session().map(|s| s.email.clone());
                self.state.login = LoginState::default();
                self.state.dash = DashboardUi::default();
                self.state.screen = Screen::Dashboard;
                if let Err(err) = self.dashboard.load_data().await {
                    self.report_core_error(err);
                }
            }
            Err(err) => self.state.login.message = Some(err.to_string()),
        }
    }

    async fn handle_signup(&mut self, action: AppAction) {
        match self.state.signup.mode {
            SignUpMode::Form => self.handle_signup_form(action).await,
            SignUpMode::Verify => self.handle_signup_verify(action).await,
        }
    }

    async fn handle_signup_form(&mut self, action: AppAction) {
        match action {
            AppAction::Input(ch) => self.signup_field_mut().push(ch),
            AppAction::Backspace => {
                self.signup_field_mut().pop();
            }
            AppAction::NextField => {
                self.state.signup.focus = match self.state.signup.focus {
                    SignUpField::Name => SignUpField::Email,
                    SignUpField::Email => SignUpField::Password,
                    SignUpField::Password => SignUpField::Confirm,
                    SignUpField::Confirm => SignUpField::Name,
                };
            }
            AppAction::Cancel => self.state.screen = Screen::Login,
            AppAction::Submit => self.submit_signup().await,
            _ => {}
        }
    }

    fn signup_field_mut(&mut self) -> &mut String {
        let signup = &mut self.state.signup;
        match signup.focus {
            SignUpField::Name => &mut signup.name,
            SignUpField::Email => &mut signup.email,
            SignUpField::Password => &mut signup.password,
            SignUpField::Confirm => &mut signup.confirm,
        }
    }

    async fn submit_signup(&mut self) {
        let signup = &self.state.signup;
        if signup.password != signup.confirm {
            self.state.signup.message = Some("passwords do not match".into());
            return;
        }
        let email = signup.email.trim().to_owned();
        let password = signup.password.clone();
        let name = signup.name.trim().to_owned();

        match self.auth.sign_up(&email, &password, &name).await {
            Ok(()) => {
                self.state.signup.mode = SignUpMode::Verify;
                self.state.signup.message = None;
            }
            Err(err) => self.state.signup.message = Some(err.to_string()),
        }
    }

    async fn handle_signup_verify(&mut self, action: AppAction) {
        match action {
            AppAction::Input(ch) => self.state.signup.code.push(ch),
            AppAction::Backspace => {
                self.state.signup.code.pop();
            }
            AppAction::Cancel => {
                self.state.signup.code.clear();
                self.state.signup.mode = SignUpMode::Form;
            }
            AppAction::ResendCode => {
                let email = self.state.signup.email.trim().to_owned();
                match self.auth.resend_confirmation_code(&email).await {
                    Ok(()) => self.toast("Verification code resent.", ToastLevel::Info),
                    Err(err) => self.state.signup.message = Some(err.to_string()),
                }
            }
            AppAction::Submit => {
                let email = self.state.signup.email.trim().to_owned();
                let code = self.state.signup.code.clone();
                match self.auth.confirm_sign_up(&email, &code).await {
                    Ok(()) => {
                        self.state.login = LoginState::default();
                        self.state.login.email = email;
                        self.state.screen = Screen::Login;
                        self.toast("Account verified. Sign in to continue.", ToastLevel::Success);
                    }
                    Err(err) => self.state.signup.message = Some(err.to_string()),
                }
            }
            _ => {}
        }
    }

    async fn handle_dashboard(&mut self, action: AppAction) {
        if self.state.dash.input_mode != InputMode::None {
            self.handle_dashboard_input(action).await;
            return;
        }

        match action {
            AppAction::Input('q') => self.should_quit = true,
            AppAction::Input('a') => {
                self.state.dash.input.clear();
                self.state.dash.input_mode = InputMode::AddExpense;
            }
            AppAction::Input('b') => {
                self.state.dash.input.clear();
                self.state.dash.input_mode = InputMode::EditBudget;
            }
            AppAction::Input('d') => self.delete_selected().await,
            AppAction::Input('r') => {
                if let Err(err) = self.dashboard.load_data().await {
                    tracing::warn!("refresh failed: {err}");
                    self.report_core_error(err);
                }
                self.clamp_selection();
            }
            AppAction::Input('o') => self.sign_out(),
            AppAction::Input('j') | AppAction::Down => self.select_next(),
            AppAction::Input('k') | AppAction::Up => self.select_prev(),
            _ => {}
        }
    }

    async fn handle_dashboard_input(&mut self, action: AppAction) {
        match action {
            AppAction::Input(ch) => self.state.dash.input.push(ch),
            AppAction::Backspace => {
                self.state.dash.input.pop();
            }
            AppAction::Cancel => {
                self.state.dash.input.clear();
                self.state.dash.input_mode = InputMode::None;
            }
            AppAction::Submit => self.submit_dashboard_input().await,
            _ => {}
        }
    }

    async fn submit_dashboard_input(&mut self) {
        let input = self.state.dash.input.clone();
        let mode = self.state.dash.input_mode;
        self.state.dash.input.clear();
        self.state.dash.input_mode = InputMode::None;

        match mode {
            InputMode::AddExpense => match entry::parse(&input) {
                Ok(parsed) => {
                    let result = self.dashboard.add_expense(parsed.into_expense()).await;
                    match result {
                        Ok(()) => self.toast("Expense added.", ToastLevel::Success),
                        Err(err) => self.report_core_error(err),
                    }
                }
                Err(msg) => self.toast(msg, ToastLevel::Error),
            },
            InputMode::EditBudget => match entry::parse_amount(&input) {
                Ok(amount) => match self.dashboard.update_budget(amount).await {
                    Ok(()) => self.toast("Budget updated.", ToastLevel::Success),
                    Err(err) => self.report_core_error(err),
                },
                Err(msg) => self.toast(msg, ToastLevel::Error),
            },
            InputMode::None => {}
        }
        self.clamp_selection();
    }

    async fn delete_selected(&mut self) {
        let Some(expense) = self.dashboard.expenses().get(self.state.dash.selected) else {
            return;
        };
        let id = expense.id.clone();
        match self.dashboard.delete_expense(&id).await {
            Ok(()) => self.toast("Expense deleted.", ToastLevel::Info),
            Err(err) => self.report_core_error(err),
        }
        self.clamp_selection();
    }

    /// Failures that mean the credential is gone drop straight back to the
    /// login screen; everything else becomes a toast.
    fn report_core_error(&mut self, err: tally_core::Error) {
        if err.is_auth() {
            tracing::warn!("session no longer valid: {err}");
            self.reset_to_login();
            self.state.login.message = Some("Session expired. Sign in again.".into());
        } else {
            self.toast(err.to_string(), ToastLevel::Error);
        }
    }

    fn sign_out(&mut self) {
        tracing::info!("signing out");
        self.reset_to_login();
        self.toast("Signed out.", ToastLevel::Info);
    }

    fn reset_to_login(&mut self) {
        self.auth.sign_out();
        // Drop the cached data along with the session by starting a fresh
        // aggregator over a new gateway.
        match HttpGateway::new(&self.config.api_base_url, self.auth.store()) {
            Ok(gateway) => self.dashboard = Dashboard::new(gateway),
            Err(err) => tracing::error!("could not rebuild gateway: {err}"),
        }
        self.state = AppState::new(Screen::Login, None);
    }

    fn select_next(&mut self) {
        let len = self.dashboard.expenses().len();
        if len > 0 && self.state.dash.selected + 1 < len {
            self.state.dash.selected += 1;
        }
    }

    fn select_prev(&mut self) {
        self.state.dash.selected = self.state.dash.selected.saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let len = self.dashboard.expenses().len();
        if len == 0 {
            self.state.dash.selected = 0;
        } else if self.state.dash.selected >= len {
            self.state.dash.selected = len - 1;
        }
    }

    fn toast(&mut self, message: impl Into<String>, level: ToastLevel) {
        self.state.toast = Some(ToastState {
            message: message.into(),
            level,
            expires_at: Instant::now() + TOAST_TTL,
        });
    }

    fn expire_toast(&mut self) {
        if let Some(toast) = &self.state.toast
            && toast.expires_at <= Instant::now()
        {
            self.state.toast = None;
        }
    }
}
