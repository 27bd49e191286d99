use bytesstr::BytesStr;
use ezk_sdp_munge::{
    LocalStream, LocalTrack, MediaKind, MungeConfig, NegotiationContext, PeerInfo, Pipeline,
    SdpDocument,
};

/// Offer of a browser with audio, video and a data channel
pub(crate) const BROWSER_OFFER: &str = "\
v=0
o=- 4611731400430051336 2 IN IP4 127.0.0.1
s=-
t=0 0
a=group:BUNDLE 0 1 2
a=msid-semantic: WMS stream
m=audio 9 UDP/TLS/RTP/SAVPF 111 0 8 13
c=IN IP4 0.0.0.0
a=rtcp:9 IN IP4 0.0.0.0
a=candidate:1 1 udp 2122260223 192.168.1.2 54400 typ host generation 0
a=candidate:2 1 udp 1686052607 203.0.113.7 54400 typ srflx raddr 192.168.1.2 rport 54400 generation 0
a=candidate:3 1 udp 41885439 198.51.100.9 3478 typ relay raddr 203.0.113.7 rport 54400 generation 0
a=ice-ufrag:9uB6
a=ice-pwd:YuLFuXOjnbeMQBbAnZyTmhJ5
a=fingerprint:sha-256 19:E2:1C:3B:4B:9F:81:E6:B8:5C:F4:A5:A8:D8:73:04:BB:05:2F:70:9F:04:A9:0E:05:E9:26:33:E8:70:88:A2
a=setup:actpass
a=mid:0
a=sendrecv
a=rtcp-mux
a=rtpmap:111 opus/48000/2
a=fmtp:111 minptime=10;useinbandfec=1
a=rtpmap:0 PCMU/8000
a=rtpmap:8 PCMA/8000
a=rtpmap:13 CN/8000
a=ssrc:1001 cname:remote
m=video 9 UDP/TLS/RTP/SAVPF 96 97 98 99 116 117 118
c=IN IP4 0.0.0.0
a=mid:1
a=sendrecv
a=rtcp-mux
a=rtpmap:96 VP8/90000
a=rtcp-fb:96 goog-remb
a=rtcp-fb:96 nack
a=rtpmap:97 rtx/90000
a=fmtp:97 apt=96
a=rtpmap:98 H264/90000
a=fmtp:98 level-asymmetry-allowed=1;packetization-mode=1;profile-level-id=42e01f
a=rtpmap:99 rtx/90000
a=fmtp:99 apt=98
a=rtpmap:116 red/90000
a=rtpmap:117 ulpfec/90000
a=rtpmap:118 rtx/90000
a=fmtp:118 apt=116
a=ssrc:2001 cname:remote
m=application 9 UDP/DTLS/SCTP webrtc-datachannel
c=IN IP4 0.0.0.0
a=mid:2
a=sctp-port:5000
";

/// Answer of the local media stack to [`BROWSER_OFFER`], without the data channel
pub(crate) const LOCAL_ANSWER: &str = "\
v=0
o=- 1 2 IN IP4 127.0.0.1
s=-
t=0 0
a=group:BUNDLE 0 1
m=audio 9 UDP/TLS/RTP/SAVPF 111 0
c=IN IP4 0.0.0.0
a=candidate:1 1 udp 2122260223 10.0.0.2 50000 typ host generation 0
a=mid:0
a=sendrecv
a=rtpmap:111 opus/48000/2
a=rtpmap:0 PCMU/8000
a=ssrc:3001 cname:local
m=video 9 UDP/TLS/RTP/SAVPF 96 97
c=IN IP4 0.0.0.0
a=mid:1
a=sendrecv
a=rtpmap:96 VP8/90000
a=rtpmap:97 rtx/90000
a=fmtp:97 apt=96
a=ssrc:4001 cname:local
";

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Convert a fixture to CRLF line endings
pub(crate) fn sdp(text: &str) -> BytesStr {
    BytesStr::from(text.replace('\n', "\r\n"))
}

pub(crate) fn parse(text: &str) -> SdpDocument {
    SdpDocument::parse(&BytesStr::from(text.to_owned()))
}

/// Pipeline with one opened peer called `bob`
pub(crate) fn setup(config: MungeConfig, info: PeerInfo) -> (Pipeline, NegotiationContext) {
    init_logger();

    let pipeline = Pipeline::new(config);
    let mut ctx = NegotiationContext::default();

    pipeline.open_peer(&mut ctx, "bob", info);

    (pipeline, ctx)
}

pub(crate) fn camera_stream() -> LocalStream {
    LocalStream {
        id: "camera".into(),
        tracks: vec![
            LocalTrack {
                id: "mic".into(),
                kind: MediaKind::Audio,
            },
            LocalTrack {
                id: "cam".into(),
                kind: MediaKind::Video,
            },
        ],
    }
}
