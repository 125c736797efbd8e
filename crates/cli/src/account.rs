//! User profile and settings.

use anyhow::{Context, Result};
use clap::Subcommand;

use promptvcs_core::session::{ProfileUpdate, SettingsUpdate};
use promptvcs_core::{Command, Session};

use crate::{report, style};

#[derive(Subcommand, Debug)]
pub enum ProfileAction {
    Show,
    /// Update profile fields. Omitted fields keep their value.
    Set {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        #[arg(long)]
        timezone: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum SettingsAction {
    Show,
    /// Update settings. Omitted fields keep their value.
    Set {
        #[arg(long)]
        dark_mode: Option<bool>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        email_notifications: Option<bool>,
        #[arg(long)]
        push_notifications: Option<bool>,
        #[arg(long)]
        public_profile: Option<bool>,
        #[arg(long)]
        analytics: Option<bool>,
    },
}

pub fn run_profile(session: &mut Session, action: ProfileAction) -> Result<()> {
    match action {
        ProfileAction::Show => {
            let p = &session.state().user_profile;
            println!("{}", style::header("Profile"));
            println!("  Name     : {}", p.name);
            println!("  Email    : {}", p.email);
            println!("  Bio      : {}", p.bio);
            println!("  Timezone : {}", p.timezone);
            Ok(())
        }
        ProfileAction::Set {
            name,
            email,
            bio,
            timezone,
        } => {
            let events = session
                .execute(Command::UpdateProfile(ProfileUpdate {
                    name,
                    email,
                    bio,
                    timezone,
                }))
                .context("failed to update profile")?;
            report(&events);
            Ok(())
        }
    }
}

pub fn run_settings(session: &mut Session, action: SettingsAction) -> Result<()> {
    match action {
        SettingsAction::Show => {
            let s = &session.state().user_settings;
            println!("{}", style::header("Settings"));
            println!("  Dark mode           : {}", style::flag(s.dark_mode));
            println!("  Language            : {}", s.language);
            println!("  Email notifications : {}", style::flag(s.email_notifications));
            println!("  Push notifications  : {}", style::flag(s.push_notifications));
            println!("  Public profile      : {}", style::flag(s.public_profile));
            println!("  Analytics           : {}", style::flag(s.analytics));
            Ok(())
        }
        SettingsAction::Set {
            dark_mode,
            language,
            email_notifications,
            push_notifications,
            public_profile,
            analytics,
        } => {
            let events = session
                .execute(Command::UpdateSettings(SettingsUpdate {
                    dark_mode,
                    language,
                    email_notifications,
                    push_notifications,
                    public_profile,
                    analytics,
                }))
                .context("failed to update settings")?;
            report(&events);
            Ok(())
        }
    }
}
