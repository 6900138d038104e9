// SPDX-License-Identifier: Apache-2.0
// Copyright Open Network Fabric Authors

//! IP header sanity checks

use crate::device::HeaderChecks;
use crate::forward::FrameProcessor;
use net::drop::DropReason;
use net::ip::IpHeader;

impl FrameProcessor<'_> {
    /// Apply the given checks to a header. Structural checks come first.
    pub(crate) fn check_header(header: &IpHeader, checks: HeaderChecks) -> Result<(), DropReason> {
        if checks.contains(HeaderChecks::IHL)
            && let IpHeader::V4(ipv4) = header
            && !ipv4.is_valid_ihl()
        {
            return Err(DropReason::Malformed);
        }
        if checks.contains(HeaderChecks::VERSION) && header.version() != header.expected_version() {
            return Err(DropReason::Malformed);
        }
        if checks.contains(HeaderChecks::TTL) && header.ttl() == 0 {
            return Err(DropReason::HopLimitExceeded);
        }
        let (src, dst) = (header.source(), header.destination());
        if (checks.contains(HeaderChecks::SRC_MULTICAST) && src.is_multicast())
            || (checks.contains(HeaderChecks::SRC_LOOPBACK) && src.is_loopback())
            || (checks.contains(HeaderChecks::DST_LOOPBACK) && dst.is_loopback())
        {
            return Err(DropReason::Filtered);
        }
        Ok(())
    }
}
