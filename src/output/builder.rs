// sixela::output::builder
//
// TOC
// - impl<W> SixelOutput<W> (fluent setters)

use super::SixelOutput;
use devela::sys::Write as IoWrite;

impl<W: IoWrite> SixelOutput<W> {
    /// Enables 8-bit C1 control sequences instead of 7-bit escapes.
    #[inline]
    #[must_use]
    pub fn with_8bit_control(mut self, enabled: bool) -> Self {
        self.set_8bit_availability(enabled);
        self
    }

    /// Sets whether the GRI repeat-count argument is unlimited (`true`) or
    /// capped to 255 as on a real VT (`false`).
    #[inline]
    #[must_use]
    pub fn with_gri_arg_limit(mut self, unlimited: bool) -> Self {
        self.set_gri_arg_limit(unlimited);
        self
    }

    /// Enables GNU Screen penetration (packetized DCS wrapping).
    #[inline]
    #[must_use]
    pub fn with_penetrate_multiplexer(mut self, enabled: bool) -> Self {
        self.set_penetrate_multiplexer(enabled);
        self
    }

    /// Skips emitting the DCS envelope, for embedding raw sixel body bytes.
    #[inline]
    #[must_use]
    pub fn with_skip_dcs_envelope(mut self, skip: bool) -> Self {
        self.set_skip_dcs_envelope(skip);
        self
    }

    /// Sets the palette color-system selector used in DECGCI output.
    #[inline]
    #[must_use]
    pub fn with_palette_type(mut self, palette_type: super::PaletteType) -> Self {
        self.set_palette_type(palette_type);
        self
    }

    /// Sets the run-length encoding policy.
    #[inline]
    #[must_use]
    pub fn with_encode_policy(mut self, policy: super::EncodePolicy) -> Self {
        self.set_encode_policy(policy);
        self
    }
}
