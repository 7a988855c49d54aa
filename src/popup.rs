//! Transient notification popup with animated open/close.
//!
//! ```text
//!   Hidden ──show──▶ Opening ──anim done──▶ Visible ──hide/timeout──▶ Closing ──anim done──▶ Hidden
//!                      ▲  │                    │ show: swap content,          │
//!                      │  └─show: restart──────┘ restart timer                │
//!                      └───────────────────────── show ───────────────────────┘
//! ```
//!
//! Every started animation carries a fresh [`AnimationToken`].  A
//! completion for any other token belongs to a superseded animation and
//! is ignored, so cancelling an animation never has to race its timer.

use crate::config::POPUP_ANIMATION_MS;
use crate::notify::{Content, Title};
use crate::text::truncated;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PopupStatus {
    Hidden,
    Opening,
    Visible,
    Closing,
}

/// Generation counter identifying one animation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnimationToken(u32);

impl AnimationToken {
    fn next(self) -> Self {
        AnimationToken(self.0.wrapping_add(1))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnimationKind {
    Open,
    Close,
}

#[derive(Clone, Copy, Debug)]
struct Animation {
    kind: AnimationKind,
    token: AnimationToken,
    started_ms: u64,
}

pub struct Popup {
    status: PopupStatus,
    title: Title,
    content: Content,
    timeout_ms: u32,
    dismiss_at: Option<u64>,
    visible_since: Option<u64>,
    token: AnimationToken,
    animation: Option<Animation>,
    animation_ms: u64,
}

impl Popup {
    pub fn new() -> Self {
        Self::with_animation_ms(POPUP_ANIMATION_MS)
    }

    pub fn with_animation_ms(animation_ms: u64) -> Self {
        Self {
            status: PopupStatus::Hidden,
            title: Title::new(),
            content: Content::new(),
            timeout_ms: 0,
            dismiss_at: None,
            visible_since: None,
            token: AnimationToken(0),
            animation: None,
            animation_ms,
        }
    }

    /// Show `title`/`content`, auto-dismissing after `timeout_ms`
    /// (0 = stay until hidden or replaced).
    ///
    /// On a visible popup only the text and the timer change.  Anywhere
    /// else the open animation (re)starts from the beginning.
    pub fn show(&mut self, title: &str, content: &str, timeout_ms: u32, now_ms: u64) {
        self.title = truncated(title);
        self.content = truncated(content);
        self.timeout_ms = timeout_ms;

        match self.status {
            PopupStatus::Visible => {
                debug!("popup: content replaced");
            }
            PopupStatus::Hidden => {
                self.start_animation(AnimationKind::Open, now_ms);
                self.status = PopupStatus::Opening;
            }
            PopupStatus::Opening | PopupStatus::Closing => {
                debug!("popup: {} interrupted, reopening", self.status);
                self.start_animation(AnimationKind::Open, now_ms);
                self.status = PopupStatus::Opening;
            }
        }
        self.arm_timer(now_ms);
    }

    /// Start closing. Only a fully visible popup reacts.
    pub fn hide(&mut self, now_ms: u64) {
        if self.status != PopupStatus::Visible {
            return;
        }
        self.dismiss_at = None;
        self.start_animation(AnimationKind::Close, now_ms);
        self.status = PopupStatus::Closing;
    }

    /// Completion callback of the animation identified by `token`.
    ///
    /// Returns `false` when the token is stale and nothing happened.
    pub fn complete_animation(&mut self, token: AnimationToken, now_ms: u64) -> bool {
        match self.animation {
            Some(anim) if anim.token == token => {}
            _ => {
                trace!("popup: stale animation completion ignored");
                return false;
            }
        }

        self.animation = None;
        self.token = self.token.next();
        match self.status {
            PopupStatus::Opening => {
                self.status = PopupStatus::Visible;
                self.visible_since = Some(now_ms);
            }
            PopupStatus::Closing => {
                self.status = PopupStatus::Hidden;
                self.visible_since = None;
            }
            PopupStatus::Hidden | PopupStatus::Visible => {}
        }
        debug!("popup: now {}", self.status);
        true
    }

    /// Advance animations and the dismiss timer to `now_ms`.
    pub fn tick(&mut self, now_ms: u64) {
        if let Some(anim) = self.animation {
            if now_ms.saturating_sub(anim.started_ms) >= self.animation_ms {
                self.complete_animation(anim.token, now_ms);
            }
        }

        if let Some(at) = self.dismiss_at {
            if now_ms >= at {
                match self.status {
                    // Fires once the popup has finished opening.
                    PopupStatus::Opening => {}
                    PopupStatus::Visible => self.hide(now_ms),
                    PopupStatus::Hidden | PopupStatus::Closing => self.dismiss_at = None,
                }
            }
        }
    }

    fn start_animation(&mut self, kind: AnimationKind, now_ms: u64) {
        self.token = self.token.next();
        self.animation = Some(Animation {
            kind,
            token: self.token,
            started_ms: now_ms,
        });
    }

    fn arm_timer(&mut self, now_ms: u64) {
        self.dismiss_at = if self.timeout_ms > 0 {
            Some(now_ms + u64::from(self.timeout_ms))
        } else {
            None
        };
    }

    pub fn status(&self) -> PopupStatus {
        self.status
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// When the armed dismiss timer fires, if any.
    pub fn dismiss_at(&self) -> Option<u64> {
        self.dismiss_at
    }

    pub fn visible_since(&self) -> Option<u64> {
        self.visible_since
    }

    /// Current generation; advances on every start and completion.
    pub fn token(&self) -> AnimationToken {
        self.token
    }

    /// Token and kind of the animation in flight.
    pub fn animation(&self) -> Option<(AnimationKind, AnimationToken)> {
        self.animation.map(|a| (a.kind, a.token))
    }

    /// How far the popup is open, 0..=100: ease-out while opening,
    /// ease-in while closing.
    pub fn progress(&self, now_ms: u64) -> u8 {
        let linear = |anim: &Animation| -> u64 {
            if self.animation_ms == 0 {
                return 100;
            }
            (now_ms.saturating_sub(anim.started_ms) * 100 / self.animation_ms).min(100)
        };

        match (self.status, self.animation.as_ref()) {
            (PopupStatus::Hidden, _) => 0,
            (PopupStatus::Visible, _) => 100,
            (PopupStatus::Opening, Some(anim)) => {
                let rest = 100 - linear(anim);
                (100 - rest * rest / 100) as u8
            }
            (PopupStatus::Closing, Some(anim)) => {
                let p = linear(anim);
                (100 - p * p / 100) as u8
            }
            (PopupStatus::Opening, None) => 100,
            (PopupStatus::Closing, None) => 0,
        }
    }
}

impl Default for Popup {
    fn default() -> Self {
        Self::new()
    }
}
