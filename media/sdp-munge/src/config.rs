use crate::profile::Agent;
use sdp_lines::MediaKind;

/// Session wide configuration of the rewriting pipeline
#[derive(Debug, Default, Clone)]
pub struct MungeConfig {
    /// Which media kinds are negotiated and in which direction
    pub connection: ConnectionSettings,
    /// Policy to apply to the `a=group:BUNDLE` line
    pub bundle_policy: BundlePolicy,
    /// Bandwidth limits per media kind
    pub bandwidth: BandwidthSettings,
    /// Format parameters to merge into the fmtp lines
    pub codec_params: CodecParamsSettings,
    /// Codec to list first per media kind
    pub codec_preference: CodecPreferences,
    /// Codecs and feedback mechanisms to remove from local descriptions
    pub codec_removal: CodecRemovalSettings,
    /// ICE candidate types to remove
    pub filter: FilterSettings,
    /// A multipoint control unit takes part in the session
    pub mcu_present: bool,
    /// Implementation of the local media stack
    pub local_agent: Agent,
}

/// Connection settings of a single media kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MediaConnection {
    pub enabled: bool,
    pub send: bool,
    pub receive: bool,
}

impl Default for MediaConnection {
    fn default() -> Self {
        Self {
            enabled: true,
            send: true,
            receive: true,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub audio: MediaConnection,
    pub video: MediaConnection,
    /// Only `enabled` is used for data sections
    pub data: MediaConnection,
}

impl ConnectionSettings {
    /// Settings for the given kind, unknown media kinds are always enabled
    pub fn get(&self, kind: MediaKind) -> MediaConnection {
        match kind {
            MediaKind::Audio => self.audio,
            MediaKind::Video => self.video,
            MediaKind::Data => self.data,
            MediaKind::Other => MediaConnection::default(),
        }
    }

    pub(crate) fn get_mut(&mut self, kind: MediaKind) -> Option<&mut MediaConnection> {
        match kind {
            MediaKind::Audio => Some(&mut self.audio),
            MediaKind::Video => Some(&mut self.video),
            MediaKind::Data => Some(&mut self.data),
            MediaKind::Other => None,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BundlePolicy {
    /// Leave the bundle group as generated
    #[default]
    Balanced,
    /// Rewrite the bundle group to contain exactly the enabled media
    MaxBundle,
    /// Remove the bundle group
    None,
}

/// Bandwidth limits in kilobits per second
///
/// `None` leaves the media kind untouched, a non-positive value removes existing limits without adding a new one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BandwidthSettings {
    pub audio: Option<i32>,
    pub video: Option<i32>,
    pub data: Option<i32>,
    /// `x-google-min-bitrate` for the preferred video codec
    pub video_min_bitrate: Option<u32>,
    /// `x-google-max-bitrate` for the preferred video codec
    pub video_max_bitrate: Option<u32>,
}

impl BandwidthSettings {
    pub fn get(&self, kind: MediaKind) -> Option<i32> {
        match kind {
            MediaKind::Audio => self.audio,
            MediaKind::Video => self.video,
            MediaKind::Data => self.data,
            MediaKind::Other => None,
        }
    }

    /// Values set in `overrides` replace the ones of `self`, unset values are kept
    pub fn merged(&self, overrides: &BandwidthSettings) -> BandwidthSettings {
        BandwidthSettings {
            audio: overrides.audio.or(self.audio),
            video: overrides.video.or(self.video),
            data: overrides.data.or(self.data),
            video_min_bitrate: overrides.video_min_bitrate.or(self.video_min_bitrate),
            video_max_bitrate: overrides.video_max_bitrate.or(self.video_max_bitrate),
        }
    }
}

/// Value of a configured format parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    /// `true` renders the key with value `1`, `false` removes the key
    Bool(bool),
    Integer(i64),
    Text(String),
}

/// Format parameter edits for every payload type of a codec
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecParamEdit {
    pub kind: MediaKind,
    /// Encoding name, compared case insensitive
    pub codec: String,
    /// Only edit payload types with this clock rate
    pub clock_rate: Option<u32>,
    /// Parameters in the order new keys are appended
    pub params: Vec<(String, ParamValue)>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct OpusParams {
    pub stereo: Option<bool>,
    pub usedtx: Option<bool>,
    pub useinbandfec: Option<bool>,
    pub maxplaybackrate: Option<u32>,
    pub minptime: Option<u32>,
}

/// Decoder capabilities of VP8 and VP9
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct VpxParams {
    pub max_fr: Option<u32>,
    pub max_fs: Option<u32>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct H264Params {
    pub profile_level_id: Option<String>,
    pub level_asymmetry_allowed: Option<bool>,
    pub packetization_mode: Option<bool>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CodecParamsSettings {
    pub opus: OpusParams,
    pub vp8: VpxParams,
    pub vp9: VpxParams,
    pub h264: H264Params,
    /// Additional edits, applied after the typed ones
    pub custom: Vec<CodecParamEdit>,
}

impl CodecParamsSettings {
    /// All configured edits, codecs without configured parameters are skipped
    pub fn edits(&self) -> Vec<CodecParamEdit> {
        let opus = &self.opus;
        let h264 = &self.h264;

        let typed = [
            (
                MediaKind::Audio,
                "opus",
                Some(48000),
                vec![
                    ("stereo", opus.stereo.map(ParamValue::Bool)),
                    ("usedtx", opus.usedtx.map(ParamValue::Bool)),
                    ("useinbandfec", opus.useinbandfec.map(ParamValue::Bool)),
                    ("maxplaybackrate", opus.maxplaybackrate.map(integer)),
                    ("minptime", opus.minptime.map(integer)),
                ],
            ),
            (MediaKind::Video, "VP8", None, vpx(&self.vp8)),
            (MediaKind::Video, "VP9", None, vpx(&self.vp9)),
            (
                MediaKind::Video,
                "H264",
                None,
                vec![
                    (
                        "profile-level-id",
                        h264.profile_level_id.clone().map(ParamValue::Text),
                    ),
                    (
                        "level-asymmetry-allowed",
                        h264.level_asymmetry_allowed.map(ParamValue::Bool),
                    ),
                    (
                        "packetization-mode",
                        h264.packetization_mode.map(ParamValue::Bool),
                    ),
                ],
            ),
        ];

        typed
            .into_iter()
            .map(|(kind, codec, clock_rate, params)| CodecParamEdit {
                kind,
                codec: codec.into(),
                clock_rate,
                params: params
                    .into_iter()
                    .filter_map(|(key, value)| Some((key.to_owned(), value?)))
                    .collect(),
            })
            .chain(self.custom.iter().cloned())
            .filter(|edit| !edit.params.is_empty())
            .collect()
    }
}

fn integer(value: u32) -> ParamValue {
    ParamValue::Integer(value.into())
}

fn vpx(params: &VpxParams) -> Vec<(&'static str, Option<ParamValue>)> {
    vec![
        ("max-fr", params.max_fr.map(integer)),
        ("max-fs", params.max_fs.map(integer)),
    ]
}

/// Codec to prefer for a media kind
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum CodecPreference {
    /// Keep the order chosen by the media stack
    #[default]
    Auto,
    Codec {
        codec: String,
        sampling_rate: Option<u32>,
        channels: Option<u32>,
    },
}

impl CodecPreference {
    pub fn codec(codec: impl Into<String>) -> Self {
        Self::Codec {
            codec: codec.into(),
            sampling_rate: None,
            channels: None,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CodecPreferences {
    pub audio: CodecPreference,
    pub video: CodecPreference,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CodecRemovalSettings {
    /// Remove `red` and `ulpfec` from video, ignored while an MCU is present
    pub disable_video_fec: bool,
    /// Remove `CN` from audio when stereo opus is configured
    pub disable_comfort_noise: bool,
    /// Remove `goog-remb` rtcp feedback
    pub disable_remb: bool,
    /// Additional codecs to remove
    pub codecs: Vec<(MediaKind, String)>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilterSettings {
    pub drop_host: bool,
    pub drop_srflx: bool,
    pub drop_relay: bool,
    /// Only relay candidates are allowed, implies dropping host and srflx candidates
    pub force_relay_only: bool,
}

/// Per peer replacements of the session wide settings
#[derive(Debug, Default, Clone)]
pub struct PeerOverrides {
    /// Merged field by field into the session wide limits
    pub bandwidth: Option<BandwidthSettings>,
    pub filter: Option<FilterSettings>,
    pub bundle_policy: Option<BundlePolicy>,
}

/// Metadata of a remote peer
#[derive(Debug, Clone)]
pub struct PeerInfo {
    /// Implementation the peer declared
    pub agent: Agent,
    /// The peer is a multipoint control unit
    pub is_mcu: bool,
    /// Candidates are exchanged incrementally
    pub trickle_ice: bool,
    pub overrides: PeerOverrides,
}

impl Default for PeerInfo {
    fn default() -> Self {
        Self {
            agent: Agent::Other,
            is_mcu: false,
            trickle_ice: true,
            overrides: PeerOverrides::default(),
        }
    }
}

/// Locally attached media stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalStream {
    pub id: String,
    pub tracks: Vec<LocalTrack>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalTrack {
    pub id: String,
    pub kind: MediaKind,
}
